//! Identity resolution: usernames and group references from record fields.
//!
//! Everything here is a pure function of the record and configuration, apart
//! from the team-leader naming rule, which belongs to the directory and is
//! required to be deterministic.

use serde::{Deserialize, Serialize};

use rollcall_directory::DirectoryStore;

use crate::record::{ContactName, ProvisioningRecord};

/// The account fields derived for a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountIdentity {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// How usernames are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsernameConvention {
    /// Delegate to `DirectoryStore::derive_username(org, first, last)`.
    TeamLeader,
    /// `lowercase(first initial + last name)`.
    Mentor,
}

/// Per-record identity problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The full name has no space to split on.
    #[error("cannot split name {name:?} into first and last name")]
    MalformedName { name: String },

    /// The team-leader convention needs an organization identifier.
    #[error("no organisation identifier to derive a username from")]
    MissingOrganization,
}

/// Split a full name on the first space. Everything after it is the last name.
///
/// ```
/// use rollcall_core::identity::split_name;
/// assert_eq!(
///     split_name("Ada Lovelace Byron").unwrap(),
///     ("Ada".to_string(), "Lovelace Byron".to_string())
/// );
/// ```
pub fn split_name(full: &str) -> Result<(String, String), IdentityError> {
    let trimmed = full.trim();
    match trimmed.split_once(' ') {
        Some((first, last)) if !first.is_empty() && !last.trim().is_empty() => {
            Ok((first.to_string(), last.trim().to_string()))
        }
        _ => Err(IdentityError::MalformedName {
            name: full.to_string(),
        }),
    }
}

/// `lowercase(first character of first name + last name)`.
pub fn mentor_username(first_name: &str, last_name: &str) -> String {
    let initial: String = first_name.chars().take(1).collect();
    format!("{initial}{last_name}").to_lowercase()
}

/// Derive the account identity for `record`.
pub fn resolve_identity<D: DirectoryStore + ?Sized>(
    record: &ProvisioningRecord,
    convention: UsernameConvention,
    store: &D,
) -> Result<AccountIdentity, IdentityError> {
    let (first_name, last_name) = match record.contact_name() {
        ContactName::Full(full) => split_name(full)?,
        ContactName::Split { first, last } => (first.trim().to_string(), last.trim().to_string()),
    };

    let username = match convention {
        UsernameConvention::Mentor => mentor_username(&first_name, &last_name),
        UsernameConvention::TeamLeader => {
            let org = record
                .org_identifier()
                .ok_or(IdentityError::MissingOrganization)?;
            store.derive_username(org, &first_name, &last_name)
        }
    };

    Ok(AccountIdentity {
        username,
        first_name,
        last_name,
        email: record.contact_email().trim().to_string(),
    })
}

// ──────────────────────────────────────────────
// Groups
// ──────────────────────────────────────────────

/// The role a group plays for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Organization,
    Team,
    Role,
}

/// A group a record must join, as named in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub name: String,
    pub kind: GroupKind,
    /// Filled in by the conflict checker.
    pub exists: bool,
}

impl GroupRef {
    fn new(name: String, kind: GroupKind) -> Self {
        GroupRef {
            name,
            kind,
            exists: false,
        }
    }
}

/// Maps organization and team identifiers to directory group names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupNaming {
    pub organization_prefix: String,
    pub team_prefix: String,
}

impl GroupNaming {
    pub fn organization(&self, identifier: &str) -> String {
        format!("{}{}", self.organization_prefix, identifier)
    }

    pub fn team(&self, identifier: &str) -> String {
        format!("{}{}", self.team_prefix, identifier)
    }
}

/// Every group a record joins, in attach order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGroups {
    pub organization: Option<GroupRef>,
    pub teams: Vec<GroupRef>,
    pub role: GroupRef,
}

impl ResolvedGroups {
    /// Organization and team groups, the ones looked up per record.
    pub fn affiliation(&self) -> impl Iterator<Item = &GroupRef> {
        self.organization.iter().chain(self.teams.iter())
    }

    pub fn affiliation_mut(&mut self) -> impl Iterator<Item = &mut GroupRef> {
        self.organization.iter_mut().chain(self.teams.iter_mut())
    }

    /// Distinct directory group names, in attach order.
    pub fn distinct_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for g in self.affiliation().chain(std::iter::once(&self.role)) {
            if !names.contains(&g.name) {
                names.push(g.name.clone());
            }
        }
        names
    }
}

/// Resolve the groups for `record`. The organization group comes from the
/// first group identifier; every identifier also names a team group.
pub fn resolve_groups(
    record: &ProvisioningRecord,
    naming: &GroupNaming,
    role_group: &str,
) -> ResolvedGroups {
    let ids = record.group_identifiers();
    ResolvedGroups {
        organization: ids
            .first()
            .map(|id| GroupRef::new(naming.organization(id), GroupKind::Organization)),
        teams: ids
            .iter()
            .map(|id| GroupRef::new(naming.team(id), GroupKind::Team))
            .collect(),
        role: GroupRef::new(role_group.to_string(), GroupKind::Role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_directory::MemoryDirectory;

    fn team_record(name: &str) -> ProvisioningRecord {
        ProvisioningRecord::for_organization(
            ContactName::Full(name.into()),
            " jane@example.com ",
            vec!["ABC".into(), "ABC-ROBOT".into()],
            None,
            "ABC.yaml",
        )
    }

    #[test]
    fn split_keeps_multi_part_surnames() {
        assert_eq!(
            split_name("Ada Lovelace Byron").unwrap(),
            ("Ada".to_string(), "Lovelace Byron".to_string())
        );
    }

    #[test]
    fn split_without_space_is_malformed() {
        assert_eq!(
            split_name("Cher"),
            Err(IdentityError::MalformedName {
                name: "Cher".into()
            })
        );
        assert!(split_name("  Cher  ").is_err());
    }

    #[test]
    fn mentor_convention() {
        assert_eq!(mentor_username("Jane", "Doe"), "jdoe");
        assert_eq!(mentor_username("Émile", "Zola"), "ézola");
    }

    #[test]
    fn team_leader_delegates_to_directory_rule() {
        let dir = MemoryDirectory::new();
        let id = resolve_identity(&team_record("Jane Doe"), UsernameConvention::TeamLeader, &dir)
            .unwrap();
        assert_eq!(id.username, "abc_jdoe");
        assert_eq!(id.first_name, "Jane");
        assert_eq!(id.last_name, "Doe");
        assert_eq!(id.email, "jane@example.com");
    }

    #[test]
    fn derivation_is_repeatable() {
        let dir = MemoryDirectory::new();
        let a = resolve_identity(&team_record("Jane Doe"), UsernameConvention::TeamLeader, &dir);
        let b = resolve_identity(&team_record("Jane Doe"), UsernameConvention::TeamLeader, &dir);
        assert_eq!(a, b);
    }

    #[test]
    fn team_leader_without_org_fails() {
        let record = ProvisioningRecord::unaffiliated(
            ContactName::Full("Jane Doe".into()),
            "jane@example.com",
            "line 1",
        );
        let err = resolve_identity(&record, UsernameConvention::TeamLeader, &MemoryDirectory::new())
            .unwrap_err();
        assert_eq!(err, IdentityError::MissingOrganization);
    }

    #[test]
    fn groups_follow_identifiers_and_naming() {
        let naming = GroupNaming {
            organization_prefix: "college-".into(),
            team_prefix: "team-".into(),
        };
        let groups = resolve_groups(&team_record("Jane Doe"), &naming, "teachers");
        assert_eq!(groups.organization.as_ref().unwrap().name, "college-ABC");
        let teams: Vec<&str> = groups.teams.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(teams, ["team-ABC", "team-ABC-ROBOT"]);
        assert_eq!(groups.role.kind, GroupKind::Role);
    }

    #[test]
    fn unprefixed_primary_team_shares_the_organization_group() {
        let groups = resolve_groups(&team_record("Jane Doe"), &GroupNaming::default(), "teachers");
        assert_eq!(groups.distinct_names(), ["ABC", "ABC-ROBOT", "teachers"]);
    }
}
