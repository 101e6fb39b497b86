//! In-memory directory backend.
//!
//! Holds users and groups in ordered maps. Used directly by tests and dry
//! runs, and as the working copy behind [`JsonDirectory`](crate::JsonDirectory).

use std::collections::BTreeMap;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::record::{GroupHandle, UserHandle};
use crate::traits::DirectoryStore;

/// Length of generated initial credentials.
const INITIAL_PASSWORD_LEN: usize = 12;

/// The complete persisted contents of a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryState {
    #[serde(default)]
    pub users: BTreeMap<String, UserHandle>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupHandle>,
}

/// Directory held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    state: DirectoryState,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        MemoryDirectory::default()
    }

    pub fn from_state(state: DirectoryState) -> Self {
        MemoryDirectory { state }
    }

    /// Create a directory that already holds the named (empty) groups.
    pub fn with_groups<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dir = MemoryDirectory::new();
        for name in names {
            dir.add_group(name.as_ref());
        }
        dir
    }

    /// Create an empty group. Returns `false` if it already existed.
    ///
    /// This is an administrative operation; provisioning never calls it.
    pub fn add_group(&mut self, name: &str) -> bool {
        if self.state.groups.contains_key(name) {
            return false;
        }
        self.state
            .groups
            .insert(name.to_string(), GroupHandle::new(name));
        true
    }

    pub fn state(&self) -> &DirectoryState {
        &self.state
    }

    pub fn user_count(&self) -> usize {
        self.state.users.len()
    }

    /// Names of the groups `username` is a member of, in name order.
    pub fn memberships(&self, username: &str) -> Vec<String> {
        self.state
            .groups
            .values()
            .filter(|g| g.has_member(username))
            .map(|g| g.name.clone())
            .collect()
    }
}

impl DirectoryStore for MemoryDirectory {
    fn user_exists(&self, username: &str) -> Result<bool, DirectoryError> {
        Ok(self.state.users.contains_key(username))
    }

    fn user(&self, username: &str) -> Result<UserHandle, DirectoryError> {
        self.state
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| DirectoryError::UserNotFound {
                username: username.to_string(),
            })
    }

    fn create_user(&mut self, username: &str) -> Result<UserHandle, DirectoryError> {
        if self.state.users.contains_key(username) {
            return Err(DirectoryError::UserExists {
                username: username.to_string(),
            });
        }
        Ok(UserHandle::new(username, generate_password()))
    }

    fn save(&mut self, user: &UserHandle) -> Result<(), DirectoryError> {
        self.state
            .users
            .insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn group_exists(&self, name: &str) -> Result<bool, DirectoryError> {
        Ok(self.state.groups.contains_key(name))
    }

    fn group(&self, name: &str) -> Result<GroupHandle, DirectoryError> {
        self.state
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::GroupNotFound {
                name: name.to_string(),
            })
    }

    fn group_save(&mut self, group: &GroupHandle) -> Result<(), DirectoryError> {
        match self.state.groups.get_mut(&group.name) {
            Some(stored) => {
                *stored = group.clone();
                Ok(())
            }
            None => Err(DirectoryError::GroupNotFound {
                name: group.name.clone(),
            }),
        }
    }

    fn derive_username(&self, org: &str, first_name: &str, last_name: &str) -> String {
        default_username_rule(org, first_name, last_name)
    }
}

/// Naming rule shared by the bundled backends:
/// `<org>_<first initial><last name>`, lowercased, alphanumerics only.
/// Accented letters are kept as they are.
///
/// ```
/// assert_eq!(rollcall_directory::default_username_rule("ABC", "Jane", "Doe"), "abc_jdoe");
/// ```
pub fn default_username_rule(org: &str, first_name: &str, last_name: &str) -> String {
    let initial: String = first_name.chars().take(1).collect();
    let local: String = format!("{initial}{last_name}")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    format!("{}_{}", org.to_lowercase(), local.to_lowercase())
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INITIAL_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
