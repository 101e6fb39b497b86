//! Notifier backends.
//!
//! - [`OutboxNotifier`] spools one JSON line per message for a mailer to pick up
//! - [`LogNotifier`] only records the send in the log
//! - [`RecordingNotifier`] keeps messages in memory and can refuse chosen recipients

use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::NotifyError;
use crate::record::UserHandle;
use crate::traits::Notifier;

// ──────────────────────────────────────────────
// OutboxNotifier
// ──────────────────────────────────────────────

/// A single spooled message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub template: String,
    pub to: String,
    pub username: String,
    pub variables: BTreeMap<String, String>,
    /// RFC 3339 timestamp.
    pub queued_at: String,
}

/// Appends messages to a JSON-lines spool file.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: &Path) -> Self {
        OutboxNotifier {
            path: path.to_path_buf(),
        }
    }

    /// Read back every message in a spool file.
    pub fn read_all(path: &Path) -> Result<Vec<OutboxMessage>, NotifyError> {
        let content = std::fs::read_to_string(path).map_err(|source| NotifyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(NotifyError::from))
            .collect()
    }
}

impl Notifier for OutboxNotifier {
    fn send(
        &mut self,
        template: &str,
        user: &UserHandle,
        variables: &BTreeMap<String, String>,
    ) -> Result<(), NotifyError> {
        let queued_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let message = OutboxMessage {
            template: template.to_string(),
            to: user.email.clone(),
            username: user.username.clone(),
            variables: variables.clone(),
            queued_at,
        };
        let line = serde_json::to_string(&message)?;

        let io_err = |source| NotifyError::Io {
            path: self.path.display().to_string(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "{line}").map_err(io_err)?;
        Ok(())
    }
}

// ──────────────────────────────────────────────
// LogNotifier
// ──────────────────────────────────────────────

/// Logs each send at info level and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(
        &mut self,
        template: &str,
        user: &UserHandle,
        _variables: &BTreeMap<String, String>,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            template,
            username = %user.username,
            to = %user.email,
            "notification not delivered (no outbox configured)"
        );
        Ok(())
    }
}

// ──────────────────────────────────────────────
// RecordingNotifier
// ──────────────────────────────────────────────

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub template: String,
    pub username: String,
    pub variables: BTreeMap<String, String>,
}

/// Keeps every message in memory. Recipients listed with `reject` fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Vec<SentMessage>,
    rejected: BTreeSet<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    /// Make sends to `username` fail with `NotifyError::Rejected`.
    pub fn reject(mut self, username: &str) -> Self {
        self.rejected.insert(username.to_string());
        self
    }
}

impl Notifier for RecordingNotifier {
    fn send(
        &mut self,
        template: &str,
        user: &UserHandle,
        variables: &BTreeMap<String, String>,
    ) -> Result<(), NotifyError> {
        if self.rejected.contains(&user.username) {
            return Err(NotifyError::Rejected {
                recipient: user.username.clone(),
                reason: "recipient refused by test notifier".to_string(),
            });
        }
        self.sent.push(SentMessage {
            template: template.to_string(),
            username: user.username.clone(),
            variables: variables.clone(),
        });
        Ok(())
    }
}
