use std::collections::BTreeMap;

use crate::error::{DirectoryError, NotifyError};
use crate::record::{AccountFields, GroupHandle, UserHandle};

/// The user/group directory that provisioning mutates but does not own.
///
/// ## Persistence model
///
/// There is no multi-object transaction. Every `save` and `group_save`
/// persists exactly one object, immediately. A sequence such as
/// create → save → attach to N groups can therefore stop part way and
/// leave the earlier writes in place.
///
/// ## Handles
///
/// `create_user` and `group` return detached handles. Mutations made through
/// `set_fields`, `group_add_member` and `group_set_description` only touch the
/// handle; they become visible to lookups after `save` / `group_save`.
/// The mutators have default implementations that edit the handle in place;
/// remote backends or test fakes override them.
///
/// ## Groups
///
/// Groups are looked up, never created by this trait. A missing group is
/// reported with `DirectoryError::GroupNotFound`.
pub trait DirectoryStore {
    // ── Users ─────────────────────────────────────────────────────────────────

    /// Whether a persisted account with this username exists.
    fn user_exists(&self, username: &str) -> Result<bool, DirectoryError>;

    /// Read a persisted account.
    ///
    /// Returns `Err(DirectoryError::UserNotFound)` if the account does not exist.
    fn user(&self, username: &str) -> Result<UserHandle, DirectoryError>;

    /// Start a new account and issue its initial credential.
    ///
    /// Returns `Err(DirectoryError::UserExists)` if an account with this
    /// username has already been persisted.
    fn create_user(&mut self, username: &str) -> Result<UserHandle, DirectoryError>;

    /// Write display fields onto an account handle.
    fn set_fields(
        &mut self,
        user: &mut UserHandle,
        fields: &AccountFields,
    ) -> Result<(), DirectoryError> {
        user.apply(fields);
        Ok(())
    }

    /// Persist an account.
    fn save(&mut self, user: &UserHandle) -> Result<(), DirectoryError>;

    // ── Groups ────────────────────────────────────────────────────────────────

    /// Whether a group with this name exists.
    fn group_exists(&self, name: &str) -> Result<bool, DirectoryError>;

    /// Load a group for mutation.
    ///
    /// Returns `Err(DirectoryError::GroupNotFound)` if the group does not exist.
    fn group(&self, name: &str) -> Result<GroupHandle, DirectoryError>;

    /// Add an account to a group handle. Adding an existing member is a no-op.
    fn group_add_member(
        &mut self,
        group: &mut GroupHandle,
        user: &UserHandle,
    ) -> Result<(), DirectoryError> {
        group.members.insert(user.username.clone());
        Ok(())
    }

    /// Replace a group's description.
    fn group_set_description(
        &mut self,
        group: &mut GroupHandle,
        text: &str,
    ) -> Result<(), DirectoryError> {
        group.description = Some(text.to_string());
        Ok(())
    }

    /// Persist a group.
    ///
    /// Returns `Err(DirectoryError::GroupNotFound)` if the group was removed
    /// since it was loaded.
    fn group_save(&mut self, group: &GroupHandle) -> Result<(), DirectoryError>;

    // ── Naming ────────────────────────────────────────────────────────────────

    /// The directory's own naming rule for organization-affiliated accounts.
    ///
    /// Must be a pure function of its arguments.
    fn derive_username(&self, org: &str, first_name: &str, last_name: &str) -> String;
}

/// Delivery of templated messages to account holders.
pub trait Notifier {
    /// Send `template` to `user`, substituting `variables`.
    fn send(
        &mut self,
        template: &str,
        user: &UserHandle,
        variables: &BTreeMap<String, String>,
    ) -> Result<(), NotifyError>;
}
