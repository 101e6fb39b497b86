//! Per-record outcomes and the aggregate run report.

use serde::Serialize;

use crate::executor::StepRecord;
use crate::source::SourceKind;

/// Why a record was skipped without being an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ConflictReason {
    /// Another record in this run already claimed the derived username.
    UsernameCollision {
        username: String,
        claimed_by: String,
    },
    /// Some of the organization/team groups exist and some do not.
    InconsistentGroups {
        present: Vec<String>,
        missing: Vec<String>,
    },
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictReason::UsernameCollision {
                username,
                claimed_by,
            } => write!(f, "username {username} already claimed by {claimed_by}"),
            ConflictReason::InconsistentGroups { present, missing } => write!(
                f,
                "groups {} exist but {} do not",
                present.join(", "),
                missing.join(", ")
            ),
        }
    }
}

/// Why a record could not be provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    MalformedName { name: String },
    MissingOrganization,
    MissingGroup { groups: Vec<String> },
    /// A directory lookup failed while checking for conflicts.
    Lookup { error: String },
    /// A mutation step failed; earlier steps stay applied.
    Step { step: String, error: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::MalformedName { name } => {
                write!(f, "cannot split name {name:?} into first and last name")
            }
            FailureReason::MissingOrganization => write!(f, "no organisation identifier"),
            FailureReason::MissingGroup { groups } => {
                write!(f, "group(s) {} don't exist", groups.join(", "))
            }
            FailureReason::Lookup { error } => write!(f, "directory lookup failed: {error}"),
            FailureReason::Step { step, error } => write!(f, "{step} failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisioningOutcome {
    Created,
    /// Dry run: every check passed and the record would be created.
    WouldCreate,
    SkippedExisting,
    SkippedConflict(ConflictReason),
    Failed(FailureReason),
}

impl ProvisioningOutcome {
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            ProvisioningOutcome::SkippedExisting | ProvisioningOutcome::SkippedConflict(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    NotSent,
    Sent,
    SendFailed { error: String },
}

/// Everything that happened to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub outcome: ProvisioningOutcome,
    pub notification: NotificationStatus,
    /// True once the account itself was saved, even if a later step failed.
    pub account_persisted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
}

impl RecordReport {
    pub(crate) fn new(reference: &str, username: Option<String>, outcome: ProvisioningOutcome) -> Self {
        RecordReport {
            reference: reference.to_string(),
            username,
            outcome,
            notification: NotificationStatus::NotSent,
            account_persisted: false,
            steps: Vec::new(),
        }
    }
}

/// Aggregate result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub kind: SourceKind,
    pub dry_run: bool,
    /// Entities the source excluded as not taking part.
    pub excluded: Vec<String>,
    pub records: Vec<RecordReport>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&RecordReport) -> bool) -> usize {
        self.records.iter().filter(|r| pred(r)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|r| r.outcome == ProvisioningOutcome::Created)
    }

    pub fn would_create(&self) -> usize {
        self.count(|r| r.outcome == ProvisioningOutcome::WouldCreate)
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| r.outcome.is_skip())
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r.outcome, ProvisioningOutcome::Failed(_)))
    }

    pub fn notified(&self) -> usize {
        self.count(|r| r.notification == NotificationStatus::Sent)
    }

    pub fn notification_failures(&self) -> usize {
        self.count(|r| matches!(r.notification, NotificationStatus::SendFailed { .. }))
    }

    /// `Created <n> and skipped <m> more`.
    pub fn summary_line(&self) -> String {
        if self.dry_run {
            format!(
                "Would create {} and skip {} more",
                self.would_create(),
                self.skipped()
            )
        } else {
            format!("Created {} and skipped {} more", self.created(), self.skipped())
        }
    }

    /// `Failed <k> more`, when any record failed.
    pub fn failure_line(&self) -> Option<String> {
        match self.failed() {
            0 => None,
            n => Some(format!("Failed {n} more")),
        }
    }
}
