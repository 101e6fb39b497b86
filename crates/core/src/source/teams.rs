//! Hierarchical source: one YAML file per organization.
//!
//! ```yaml
//! name: Example College
//! teams: [ABC, ABC-ROBOT]
//! contacts:
//!   - name: Jane Doe
//!     email: jane@example.com
//! ```
//!
//! Only files named `<TLA>.yaml` (uppercase letters only) directly inside the
//! directory are read, in file-name order. A file whose `teams` list is
//! missing or empty is not taking part this cycle and is skipped silently.
//! `contacts` may be a list or a single map; the first contact is the team
//! leader.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{unreadable, SourceBatch, SourceKind};
use crate::error::{ProvisionError, SourceError};
use crate::record::{ContactName, ProvisioningRecord};
use crate::validate::is_org_identifier;

const TEAM_FILE_EXTENSION: &str = ".yaml";

/// Only the participation field, so a file that is not taking part is
/// excluded whatever the rest of it holds.
#[derive(Debug, Deserialize)]
struct Participation {
    #[serde(default)]
    teams: Option<Vec<serde_yaml::Value>>,
}

#[derive(Debug, Deserialize)]
struct TeamFile {
    #[serde(default)]
    contacts: Option<Contacts>,
    #[serde(default)]
    teams: Option<Vec<String>>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Contacts {
    Many(Vec<ContactEntry>),
    One(ContactEntry),
}

impl Contacts {
    fn into_first(self) -> Option<ContactEntry> {
        match self {
            Contacts::Many(list) => list.into_iter().next(),
            Contacts::One(entry) => Some(entry),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContactEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Whether `file_name` follows the `<TLA>.yaml` convention.
pub fn is_team_file_name(file_name: &str) -> bool {
    file_name
        .strip_suffix(TEAM_FILE_EXTENSION)
        .is_some_and(is_org_identifier)
}

/// Read every team file in `dir`.
pub fn read_team_directory(dir: &Path) -> Result<SourceBatch, ProvisionError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| unreadable(dir, format!("Couldn't stat \"{}\": {}", dir.display(), e)))?;

    let mut file_names: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| unreadable(dir, e.to_string()))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if is_team_file_name(name) {
                file_names.push(name.to_string());
            }
        }
    }
    file_names.sort();

    let mut batch = SourceBatch::new(SourceKind::Teams);
    for file_name in file_names {
        let path = dir.join(&file_name);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                batch
                    .errors
                    .push(SourceError::new(&file_name, format!("Couldn't open {file_name}: {e}")));
                continue;
            }
        };
        match parse_team_file(&file_name, &content) {
            Ok(Some(record)) => batch.records.push(record),
            Ok(None) => {
                tracing::debug!(file = %file_name, "no teams this cycle, excluded");
                batch.excluded.push(file_name);
            }
            Err(errors) => batch.errors.extend(errors),
        }
    }
    Ok(batch)
}

/// Parse one team file.
///
/// Returns `Ok(None)` for an organization that is not taking part.
pub fn parse_team_file(
    file_name: &str,
    content: &str,
) -> Result<Option<ProvisioningRecord>, Vec<SourceError>> {
    let malformed = |e: serde_yaml::Error| {
        vec![SourceError::new(
            file_name,
            format!("Malformed team record in {file_name}: {e}"),
        )]
    };

    let participation: Participation = serde_yaml::from_str(content).map_err(malformed)?;
    if participation.teams.map_or(true, |teams| teams.is_empty()) {
        return Ok(None);
    }

    let parsed: TeamFile = serde_yaml::from_str(content).map_err(malformed)?;
    let teams: Vec<String> = parsed
        .teams
        .unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .collect();

    let mut errors = Vec::new();

    let contact = parsed.contacts.and_then(Contacts::into_first);
    let contact = match contact {
        None => {
            errors.push(SourceError::new(
                file_name,
                format!("No contacts record for {file_name}"),
            ));
            None
        }
        Some(ContactEntry {
            name: Some(name),
            email: Some(email),
        }) => Some((name, email)),
        Some(_) => {
            errors.push(SourceError::new(
                file_name,
                format!("Incomplete contact record for {file_name}"),
            ));
            None
        }
    };

    // The first team name doubles as the organization identifier.
    if !is_org_identifier(&teams[0]) {
        errors.push(SourceError::new(
            file_name,
            format!("Team name \"{}\" is not the conventional format", teams[0]),
        ));
    }
    if teams.iter().any(String::is_empty) {
        errors.push(SourceError::new(
            file_name,
            format!("Blank team name in {file_name}"),
        ));
    }

    match contact {
        Some((name, email)) if errors.is_empty() => Ok(Some(ProvisioningRecord::for_organization(
            ContactName::Full(name.trim().to_string()),
            email.trim(),
            teams,
            parsed.name.map(|n| n.trim().to_string()),
            file_name,
        ))),
        _ => Err(errors),
    }
}
