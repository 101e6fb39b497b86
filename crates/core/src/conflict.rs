//! Read-only checks against the directory, run before any mutation of a record.

use std::collections::BTreeMap;

use rollcall_directory::{DirectoryError, DirectoryStore};

use crate::identity::{AccountIdentity, ResolvedGroups};
use crate::outcome::ConflictReason;

/// What to do with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Nothing blocks creation. Group existence flags are filled in.
    Proceed(ResolvedGroups),
    /// The account already exists from an earlier run.
    SkipExisting,
    Skip(ConflictReason),
    /// None of the record's organization/team groups exist.
    MissingGroups(Vec<String>),
}

/// Usernames created (or, in a dry run, that would be created) during the
/// current run, mapped to the source reference that claimed them.
pub type ClaimedUsernames = BTreeMap<String, String>;

/// Decide whether `identity` can be created and `groups` attached.
///
/// Username first: a name claimed earlier in this run is a collision between
/// two source records; a name that already exists otherwise means the record
/// was provisioned by a previous run. Then the organization/team groups:
/// all present proceeds, none present is a missing prerequisite, a mix is
/// an inconsistency that is skipped.
pub fn check<D: DirectoryStore + ?Sized>(
    store: &D,
    identity: &AccountIdentity,
    mut groups: ResolvedGroups,
    claimed: &ClaimedUsernames,
) -> Result<ConflictDecision, DirectoryError> {
    if let Some(claimed_by) = claimed.get(&identity.username) {
        return Ok(ConflictDecision::Skip(ConflictReason::UsernameCollision {
            username: identity.username.clone(),
            claimed_by: claimed_by.clone(),
        }));
    }
    if store.user_exists(&identity.username)? {
        return Ok(ConflictDecision::SkipExisting);
    }

    let mut present: Vec<String> = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    for group in groups.affiliation_mut() {
        group.exists = store.group_exists(&group.name)?;
        let bucket = if group.exists { &mut present } else { &mut missing };
        if !bucket.contains(&group.name) {
            bucket.push(group.name.clone());
        }
    }
    groups.role.exists = store.group_exists(&groups.role.name)?;

    Ok(match (present.is_empty(), missing.is_empty()) {
        (_, true) => ConflictDecision::Proceed(groups),
        (true, false) => ConflictDecision::MissingGroups(missing),
        (false, false) => {
            ConflictDecision::Skip(ConflictReason::InconsistentGroups { present, missing })
        }
    })
}
