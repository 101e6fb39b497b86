//! Welcome-message dispatch for freshly created accounts.

use std::collections::BTreeMap;

use rollcall_directory::{Notifier, UserHandle};

use crate::outcome::NotificationStatus;

pub const VAR_PASSWORD: &str = "PASSWORD";
pub const VAR_USERNAME: &str = "USERNAME";
pub const VAR_FIRST_NAME: &str = "FIRST_NAME";

/// Template variables for a welcome message.
pub fn welcome_variables(user: &UserHandle) -> BTreeMap<String, String> {
    BTreeMap::from([
        (VAR_PASSWORD.to_string(), user.initial_password.clone()),
        (VAR_USERNAME.to_string(), user.username.clone()),
        (VAR_FIRST_NAME.to_string(), user.first_name.clone()),
    ])
}

/// Send `template` to `user` unless notifications are disabled.
///
/// A send failure never propagates: it is logged and reported as
/// [`NotificationStatus::SendFailed`], and the account stays as created.
pub fn dispatch<N: Notifier + ?Sized>(
    notifier: &mut N,
    enabled: bool,
    template: &str,
    user: &UserHandle,
) -> NotificationStatus {
    if !enabled {
        tracing::debug!(username = %user.username, "notifications disabled");
        return NotificationStatus::NotSent;
    }
    match notifier.send(template, user, &welcome_variables(user)) {
        Ok(()) => {
            tracing::info!(username = %user.username, template, "welcome message sent");
            NotificationStatus::Sent
        }
        Err(e) => {
            tracing::warn!(username = %user.username, template, error = %e, "welcome message failed");
            NotificationStatus::SendFailed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_directory::RecordingNotifier;

    fn user() -> UserHandle {
        let mut u = UserHandle::new("abc_jdoe", "s3cret".into());
        u.first_name = "Jane".into();
        u
    }

    #[test]
    fn sends_credential_and_names() {
        let mut notifier = RecordingNotifier::new();
        let status = dispatch(&mut notifier, true, "teacher_welcome", &user());
        assert_eq!(status, NotificationStatus::Sent);
        let vars = &notifier.sent[0].variables;
        assert_eq!(vars["PASSWORD"], "s3cret");
        assert_eq!(vars["USERNAME"], "abc_jdoe");
        assert_eq!(vars["FIRST_NAME"], "Jane");
    }

    #[test]
    fn disabled_sends_nothing() {
        let mut notifier = RecordingNotifier::new();
        assert_eq!(
            dispatch(&mut notifier, false, "teacher_welcome", &user()),
            NotificationStatus::NotSent
        );
        assert!(notifier.sent.is_empty());
    }

    #[test]
    fn failure_is_reported_not_raised() {
        let mut notifier = RecordingNotifier::new().reject("abc_jdoe");
        let status = dispatch(&mut notifier, true, "teacher_welcome", &user());
        assert!(matches!(status, NotificationStatus::SendFailed { .. }));
    }
}
