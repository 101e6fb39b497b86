//! Conformance test suite for `DirectoryStore` implementations.
//!
//! A backend-agnostic suite any `DirectoryStore` can run to show it honours
//! the contract provisioning relies on:
//!
//! - **Users**: created accounts are invisible until saved, persisted
//!   usernames cannot be created again, credentials are issued
//! - **Groups**: lookups never create, membership is a set, descriptions
//!   and memberships persist only through `group_save`
//! - **Naming**: `derive_username` is a pure function
//!
//! # Usage
//!
//! The factory is called once per check and must return a fresh store that
//! already holds every group in [`SEED_GROUPS`] and nothing else:
//!
//! ```ignore
//! use rollcall_directory::conformance::{run_conformance_suite, SEED_GROUPS};
//! use rollcall_directory::MemoryDirectory;
//!
//! #[test]
//! fn memory_conformance() {
//!     let report = run_conformance_suite(|| MemoryDirectory::with_groups(SEED_GROUPS));
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod group;
mod naming;
mod user;

use std::fmt;

use crate::record::AccountFields;
use crate::DirectoryStore;

/// Groups every factory-produced store must already contain.
pub const SEED_GROUPS: [&str; 2] = ["conformance-org", "conformance-role"];

/// Result of a single conformance check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Check category (e.g. "user", "group").
    pub category: String,
    /// Check name (e.g. "created_user_invisible_until_saved").
    pub name: String,
    pub passed: bool,
    /// Error message if the check failed.
    pub message: Option<String>,
}

impl CheckResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<CheckResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a directory backend.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut results = Vec::new();

    results.extend(user::run_user_checks(&factory));
    results.extend(group::run_group_checks(&factory));
    results.extend(naming::run_naming_checks(&factory));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn sample_fields() -> AccountFields {
    AccountFields {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@example.com".to_string(),
        language: "english".to_string(),
    }
}

/// Create, fill in and save an account; the common prelude of most checks.
fn persisted_user<S: DirectoryStore>(
    store: &mut S,
    username: &str,
) -> Result<crate::UserHandle, String> {
    let mut user = store.create_user(username).map_err(|e| e.to_string())?;
    store
        .set_fields(&mut user, &sample_fields())
        .map_err(|e| e.to_string())?;
    store.save(&user).map_err(|e| e.to_string())?;
    Ok(user)
}
