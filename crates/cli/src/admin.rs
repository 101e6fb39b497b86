//! `rollcall directory` — prepare and inspect JSON directory files.
//!
//! Provisioning never creates groups, so they are set up here first.

use std::path::Path;

use rollcall_directory::JsonDirectory;

use crate::{report_error, OutputFormat};

pub(crate) fn cmd_group_add(
    directory: &Path,
    names: &[String],
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let mut dir = match JsonDirectory::open_or_create(directory) {
        Ok(d) => d,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            return 1;
        }
    };

    let mut added = Vec::new();
    let mut existing = Vec::new();
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            report_error("group names must not be blank", output, quiet);
            return 1;
        }
        match dir.add_group(name) {
            Ok(true) => added.push(name.to_string()),
            Ok(false) => existing.push(name.to_string()),
            Err(e) => {
                report_error(&e.to_string(), output, quiet);
                return 1;
            }
        }
    }
    tracing::info!(path = %directory.display(), added = added.len(), "groups added");

    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({ "added": added, "existing": existing });
            println!("{}", json);
        }
        OutputFormat::Text => {
            if !quiet {
                for name in &added {
                    println!("Group {} added", name);
                }
                for name in &existing {
                    println!("Group {} already exists", name);
                }
            }
        }
    }
    0
}

pub(crate) fn cmd_show(directory: &Path, output: OutputFormat, quiet: bool) -> i32 {
    let dir = match JsonDirectory::open(directory) {
        Ok(d) => d,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            return 1;
        }
    };
    let state = dir.state();

    match output {
        OutputFormat::Json => {
            // Initial credentials stay out of the listing.
            let users: Vec<serde_json::Value> = state
                .users
                .values()
                .map(|u| {
                    serde_json::json!({
                        "username": u.username,
                        "first_name": u.first_name,
                        "last_name": u.last_name,
                        "email": u.email,
                        "language": u.language,
                    })
                })
                .collect();
            let json = serde_json::json!({ "users": users, "groups": state.groups });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            println!("Users ({}):", state.users.len());
            for user in state.users.values() {
                println!(
                    "  {:<20} {} {} <{}>",
                    user.username, user.first_name, user.last_name, user.email
                );
            }
            println!("Groups ({}):", state.groups.len());
            for group in state.groups.values() {
                let members: Vec<&str> = group.members.iter().map(String::as_str).collect();
                match &group.description {
                    Some(d) => println!("  {} ({}): {}", group.name, d, members.join(", ")),
                    None => println!("  {}: {}", group.name, members.join(", ")),
                }
            }
        }
    }
    0
}
