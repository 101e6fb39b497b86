use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Display fields written onto a freshly created account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub language: String,
}

/// An account as held by the directory.
///
/// A handle returned by `create_user` is not visible to `user_exists`
/// until it has been passed to `save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Credential issued by the directory at creation time.
    pub initial_password: String,
}

impl UserHandle {
    pub fn new(username: &str, initial_password: String) -> Self {
        UserHandle {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            language: None,
            initial_password,
        }
    }

    pub fn apply(&mut self, fields: &AccountFields) {
        self.first_name = fields.first_name.clone();
        self.last_name = fields.last_name.clone();
        self.email = fields.email.clone();
        self.language = Some(fields.language.clone());
    }
}

/// A named membership set. Membership is a set: adding a member twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupHandle {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub members: BTreeSet<String>,
}

impl GroupHandle {
    pub fn new(name: &str) -> Self {
        GroupHandle {
            name: name.to_string(),
            description: None,
            members: BTreeSet::new(),
        }
    }

    pub fn has_member(&self, username: &str) -> bool {
        self.members.contains(username)
    }
}
