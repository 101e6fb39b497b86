//! CLI integration tests for all implemented subcommands.
//!
//! Uses `assert_cmd` to spawn the `rollcall` binary and verify
//! exit codes, stdout content, and stderr content.
//!
//! Every test works in its own temporary directory: the JSON directory
//! file, the rosters and the outbox all live there.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper: create a Command for the `rollcall` binary, rooted at `dir`.
fn rollcall(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("rollcall");
    cmd.current_dir(dir);
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Create `directory.json` holding the given empty groups.
fn seed_directory(tmp: &TempDir, groups: &[&str]) -> PathBuf {
    let path = tmp.path().join("directory.json");
    rollcall(tmp.path())
        .args(["directory", "group-add", "--directory", "directory.json"])
        .args(groups)
        .assert()
        .success();
    path
}

fn write_team(tmp: &TempDir, tla: &str, teams: &str, contact: &str) -> PathBuf {
    let dir = tmp.path().join("teams");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{tla}.yaml")),
        format!(
            "name: {tla} College\nteams: {teams}\ncontacts:\n  - name: {contact}\n    email: {}@example.com\n",
            tla.to_lowercase()
        ),
    )
    .unwrap();
    dir
}

fn write_file(tmp: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

fn directory_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let tmp = TempDir::new().unwrap();
    rollcall(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Bulk account provisioning from roster files",
        ));
}

#[test]
fn version_exits_0() {
    let tmp = TempDir::new().unwrap();
    rollcall(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rollcall"));
}

#[test]
fn import_without_directory_flag_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    rollcall(tmp.path())
        .args(["import", "mentors", "mentors.csv"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--directory"));
}

// ──────────────────────────────────────────────
// 2. Directory subcommands
// ──────────────────────────────────────────────

#[test]
fn group_add_creates_file_and_reports_existing_groups() {
    let tmp = TempDir::new().unwrap();
    let path = seed_directory(&tmp, &["teachers", "ABC"]);
    let json = directory_json(&path);
    assert!(json["groups"]["teachers"].is_object());
    assert!(json["groups"]["ABC"].is_object());

    rollcall(tmp.path())
        .args(["directory", "group-add", "--directory", "directory.json", "ABC", "XYZ"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Group XYZ added"))
        .stdout(predicate::str::contains("Group ABC already exists"));
}

#[test]
fn show_lists_groups() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["mentors"]);
    rollcall(tmp.path())
        .args(["directory", "show", "--directory", "directory.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Users (0):"))
        .stdout(predicate::str::contains("mentors"));
}

#[test]
fn show_missing_directory_exits_1() {
    let tmp = TempDir::new().unwrap();
    rollcall(tmp.path())
        .args(["directory", "show", "--directory", "absent.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("absent.json"));
}

// ──────────────────────────────────────────────
// 3. Import teams
// ──────────────────────────────────────────────

#[test]
fn import_teams_creates_attaches_and_mails() {
    let tmp = TempDir::new().unwrap();
    let path = seed_directory(&tmp, &["ABC", "ABC-ROBOT", "teachers"]);
    write_team(&tmp, "ABC", "[ABC, ABC-ROBOT]", "Jane Doe");

    rollcall(tmp.path())
        .args([
            "import", "teams", "teams", "--directory", "directory.json", "--outbox", "outbox.jsonl",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("User abc_jdoe created"))
        .stdout(predicate::str::contains("User abc_jdoe mailed"))
        .stdout(predicate::str::contains("Created 1 and skipped 0 more"));

    let json = directory_json(&path);
    assert_eq!(json["users"]["abc_jdoe"]["first_name"], "Jane");
    for group in ["ABC", "ABC-ROBOT", "teachers"] {
        let members = json["groups"][group]["members"].as_array().unwrap();
        assert_eq!(members, &vec![serde_json::json!("abc_jdoe")], "{group}");
    }

    let outbox = fs::read_to_string(tmp.path().join("outbox.jsonl")).unwrap();
    let lines: Vec<&str> = outbox.lines().collect();
    assert_eq!(lines.len(), 1);
    let message: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(message["template"], "teacher_welcome");
    assert_eq!(message["to"], "abc@example.com");
    assert_eq!(
        message["variables"]["PASSWORD"],
        json["users"]["abc_jdoe"]["initial_password"]
    );
}

#[test]
fn import_teams_twice_skips_existing() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["ABC", "teachers"]);
    write_team(&tmp, "ABC", "[ABC]", "Jane Doe");
    let args = ["import", "teams", "teams", "--directory", "directory.json", "--no-emails"];

    rollcall(tmp.path()).args(args).assert().success();
    rollcall(tmp.path())
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 0 and skipped 1 more"))
        .stderr(predicate::str::contains("User abc_jdoe already exists"));
}

#[test]
fn import_teams_missing_role_group_exits_1() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["ABC"]);
    write_team(&tmp, "ABC", "[ABC]", "Jane Doe");

    rollcall(tmp.path())
        .args(["import", "teams", "teams", "--directory", "directory.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Group teachers doesn't exist"));
}

#[test]
fn import_teams_malformed_file_exits_1() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["teachers"]);
    let dir = tmp.path().join("teams");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("ABC.yaml"), "teams: [ABC]\n").unwrap();

    rollcall(tmp.path())
        .args(["import", "teams", "teams", "--directory", "directory.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No contacts record for ABC.yaml"));
}

// ──────────────────────────────────────────────
// 4. Import schools
// ──────────────────────────────────────────────

const SCHOOLS: &str = "tla,organisation_name,first_name,last_name,email\n";

#[test]
fn import_schools_validation_failure_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    let path = seed_directory(&tmp, &["ABC", "teachers"]);
    let before = fs::read_to_string(&path).unwrap();
    write_file(
        &tmp,
        "schools.csv",
        &format!("{SCHOOLS}ABC,Example College,Jane,Doe,jane.example.com\n"),
    );

    rollcall(tmp.path())
        .args(["import", "schools", "schools.csv", "--directory", "directory.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Invalid email \"jane.example.com\" on line 1",
        ));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn import_schools_missing_group_exits_2_after_completing() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["ABC", "teachers"]);
    write_file(
        &tmp,
        "schools.csv",
        &format!(
            "{SCHOOLS}XYZ,Other School,John,Roe,john@example.com\nABC,Example College,Jane,Doe,jane@example.com\n"
        ),
    );

    rollcall(tmp.path())
        .args([
            "import", "schools", "schools.csv", "--directory", "directory.json", "--no-emails",
        ])
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("Created 1 and skipped 0 more"))
        .stdout(predicate::str::contains("Failed 1 more"));
}

#[test]
fn on_missing_group_abort_overrides_the_profile() {
    let tmp = TempDir::new().unwrap();
    let path = seed_directory(&tmp, &["ABC", "teachers"]);
    write_file(
        &tmp,
        "schools.csv",
        &format!(
            "{SCHOOLS}ABC,Example College,Jane,Doe,jane@example.com\nXYZ,Other School,John,Roe,john@example.com\n"
        ),
    );

    rollcall(tmp.path())
        .args([
            "import",
            "schools",
            "schools.csv",
            "--directory",
            "directory.json",
            "--on-missing-group",
            "abort",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 2: Group XYZ doesn't exist"));
    assert_eq!(directory_json(&path)["users"], serde_json::json!({}));
}

// ──────────────────────────────────────────────
// 5. Import mentors
// ──────────────────────────────────────────────

const MENTORS: &str = "first_name,last_name,email\n";

#[test]
fn import_mentors_reports_collision_as_skip() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["mentors"]);
    write_file(
        &tmp,
        "mentors.csv",
        &format!("{MENTORS}Jane,Doe,jane@example.com\nJohn,Doe,john@example.com\n"),
    );

    rollcall(tmp.path())
        .args([
            "import", "mentors", "mentors.csv", "--directory", "directory.json", "--outbox", "outbox.jsonl",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("User jdoe created"))
        .stdout(predicate::str::contains("Created 1 and skipped 1 more"));

    let outbox = fs::read_to_string(tmp.path().join("outbox.jsonl")).unwrap();
    assert_eq!(outbox.lines().count(), 1);
    assert!(outbox.contains("mentor-welcome"));
}

#[test]
fn no_emails_leaves_outbox_untouched() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["mentors"]);
    write_file(&tmp, "mentors.csv", &format!("{MENTORS}Jane,Doe,jane@example.com\n"));

    rollcall(tmp.path())
        .args([
            "import",
            "mentors",
            "mentors.csv",
            "--directory",
            "directory.json",
            "--outbox",
            "outbox.jsonl",
            "--no-emails",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("User jdoe mailed").not());
    assert!(!tmp.path().join("outbox.jsonl").exists());
}

#[test]
fn dry_run_previews_without_writing() {
    let tmp = TempDir::new().unwrap();
    let path = seed_directory(&tmp, &["mentors"]);
    write_file(&tmp, "mentors.csv", &format!("{MENTORS}Jane,Doe,jane@example.com\n"));

    rollcall(tmp.path())
        .args([
            "import", "mentors", "mentors.csv", "--directory", "directory.json", "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create 1 and skip 0 more"));
    assert_eq!(directory_json(&path)["users"], serde_json::json!({}));
}

#[test]
fn json_output_prints_the_report() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["mentors"]);
    write_file(&tmp, "mentors.csv", &format!("{MENTORS}Jane,Doe,jane@example.com\n"));

    let out = rollcall(tmp.path())
        .args([
            "--output", "json", "import", "mentors", "mentors.csv", "--directory", "directory.json", "--no-emails",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["kind"], "mentors");
    assert_eq!(report["records"][0]["username"], "jdoe");
    assert_eq!(report["records"][0]["outcome"]["status"], "created");
    assert_eq!(report["records"][0]["notification"]["status"], "not_sent");
}

// ──────────────────────────────────────────────
// 6. Configuration
// ──────────────────────────────────────────────

#[test]
fn config_overrides_role_group() {
    let tmp = TempDir::new().unwrap();
    let path = seed_directory(&tmp, &["volunteers"]);
    write_file(
        &tmp,
        "rollcall.toml",
        "language = \"welsh\"\n\n[profiles.mentors]\nrole_group = \"volunteers\"\n",
    );
    write_file(&tmp, "mentors.csv", &format!("{MENTORS}Jane,Doe,jane@example.com\n"));

    rollcall(tmp.path())
        .args([
            "--config",
            "rollcall.toml",
            "import",
            "mentors",
            "mentors.csv",
            "--directory",
            "directory.json",
            "--no-emails",
        ])
        .assert()
        .success();

    let json = directory_json(&path);
    assert_eq!(json["users"]["jdoe"]["language"], "welsh");
    assert_eq!(
        json["groups"]["volunteers"]["members"],
        serde_json::json!(["jdoe"])
    );
}

#[test]
fn invalid_config_exits_1() {
    let tmp = TempDir::new().unwrap();
    seed_directory(&tmp, &["mentors"]);
    write_file(&tmp, "rollcall.toml", "[profiles.mentors]\nrole = 3\n");
    write_file(&tmp, "mentors.csv", MENTORS);

    rollcall(tmp.path())
        .args([
            "--config", "rollcall.toml", "import", "mentors", "mentors.csv", "--directory", "directory.json",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("could not parse 'rollcall.toml'"));
}
