//! The provisioning engine.
//!
//! `Engine::run` drives one batch through every stage:
//!
//! 1. structural errors from the source adapter abort the run
//! 2. the validator runs over every record; any violation aborts the run
//! 3. the role group is checked once for the whole batch
//! 4. under the `Abort` policy, every record's groups are checked before the
//!    first mutation, so a missing prerequisite stops the run cleanly
//! 5. each record is resolved, checked, executed and notified in source order
//!
//! Steps 1–4 perform no mutation. Step 5 is strictly sequential: the
//! conflict check for a record sees every write made for earlier records.

use rollcall_directory::{DirectoryStore, Notifier};

use crate::config::{MissingGroupPolicy, SourceProfile};
use crate::conflict::{self, ClaimedUsernames, ConflictDecision};
use crate::error::ProvisionError;
use crate::executor::{self, ExecutionContext};
use crate::identity::{self, GroupNaming, IdentityError};
use crate::notify;
use crate::outcome::{
    FailureReason, NotificationStatus, ProvisioningOutcome, RecordReport, RunReport,
};
use crate::record::ProvisioningRecord;
use crate::source::SourceBatch;
use crate::validate;

/// Receives the per-record progress lines meant for the operator.
pub trait Progress {
    fn line(&mut self, text: &str);
}

/// Prints progress lines to stdout.
#[derive(Debug, Default)]
pub struct StdoutProgress;

impl Progress for StdoutProgress {
    fn line(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Discards progress lines.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn line(&mut self, _text: &str) {}
}

impl Progress for Vec<String> {
    fn line(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

/// Run-wide switches, usually set from the command line.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub language: String,
    pub groups: GroupNaming,
    pub send_notifications: bool,
    /// Resolve and check only; never mutate or notify.
    pub dry_run: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            language: crate::config::DEFAULT_LANGUAGE.to_string(),
            groups: GroupNaming::default(),
            send_notifications: true,
            dry_run: false,
        }
    }
}

pub struct Engine {
    profile: SourceProfile,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(profile: SourceProfile, settings: EngineSettings) -> Self {
        Engine { profile, settings }
    }

    /// Provision every record of `batch`.
    ///
    /// Returns `Err` only for problems that invalidate the whole batch.
    /// Everything scoped to a single record is in the returned report.
    pub fn run<D, N, P>(
        &self,
        batch: SourceBatch,
        store: &mut D,
        notifier: &mut N,
        progress: &mut P,
    ) -> Result<RunReport, ProvisionError>
    where
        D: DirectoryStore + ?Sized,
        N: Notifier + ?Sized,
        P: Progress + ?Sized,
    {
        let SourceBatch {
            kind,
            records,
            errors,
            excluded,
        } = batch;

        if !errors.is_empty() {
            tracing::error!(%kind, count = errors.len(), "source has structural errors");
            return Err(ProvisionError::StructuralInput(errors));
        }

        let (records, violations) = validate::validate(records, self.profile.rules);
        if !violations.is_empty() {
            tracing::error!(%kind, count = violations.len(), "validation failed, nothing applied");
            return Err(ProvisionError::Validation(violations));
        }

        if !store.group_exists(&self.profile.role_group)? {
            return Err(ProvisionError::MissingPrerequisiteGroup {
                group: self.profile.role_group.clone(),
                reference: None,
            });
        }

        if self.profile.on_missing_prerequisite == MissingGroupPolicy::Abort {
            self.preflight(&records, store)?;
        }

        tracing::info!(
            %kind,
            records = records.len(),
            excluded = excluded.len(),
            dry_run = self.settings.dry_run,
            "starting import"
        );

        let mut claimed = ClaimedUsernames::new();
        let mut reports = Vec::with_capacity(records.len());
        for record in &records {
            let report = self.provision(record, store, notifier, progress, &mut claimed)?;
            reports.push(report);
        }

        let report = RunReport {
            kind,
            dry_run: self.settings.dry_run,
            excluded,
            records: reports,
        };
        tracing::info!(
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            notified = report.notified(),
            "import finished"
        );
        Ok(report)
    }

    /// Check every record's groups without touching the directory.
    /// Records that will be skipped or fail identity resolution are ignored.
    fn preflight<D: DirectoryStore + ?Sized>(
        &self,
        records: &[ProvisioningRecord],
        store: &D,
    ) -> Result<(), ProvisionError> {
        let claimed = ClaimedUsernames::new();
        for record in records {
            let Ok(identity) = identity::resolve_identity(record, self.profile.convention, store) else {
                continue;
            };
            let groups = identity::resolve_groups(record, &self.settings.groups, &self.profile.role_group);
            if let ConflictDecision::MissingGroups(missing) =
                conflict::check(store, &identity, groups, &claimed)?
            {
                return Err(self.abort(record, missing));
            }
        }
        Ok(())
    }

    fn abort(&self, record: &ProvisioningRecord, missing: Vec<String>) -> ProvisionError {
        let group = missing.into_iter().next().unwrap_or_default();
        tracing::error!(reference = record.source_reference(), %group, "prerequisite group missing, aborting");
        ProvisionError::MissingPrerequisiteGroup {
            group,
            reference: Some(record.source_reference().to_string()),
        }
    }

    fn provision<D, N, P>(
        &self,
        record: &ProvisioningRecord,
        store: &mut D,
        notifier: &mut N,
        progress: &mut P,
        claimed: &mut ClaimedUsernames,
    ) -> Result<RecordReport, ProvisionError>
    where
        D: DirectoryStore + ?Sized,
        N: Notifier + ?Sized,
        P: Progress + ?Sized,
    {
        let reference = record.source_reference();

        let identity = match identity::resolve_identity(record, self.profile.convention, store) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!(reference, error = %e, "cannot resolve identity");
                let reason = match e {
                    IdentityError::MalformedName { name } => FailureReason::MalformedName { name },
                    IdentityError::MissingOrganization => FailureReason::MissingOrganization,
                };
                return Ok(RecordReport::new(reference, None, ProvisioningOutcome::Failed(reason)));
            }
        };
        let username = Some(identity.username.clone());
        let groups = identity::resolve_groups(record, &self.settings.groups, &self.profile.role_group);

        let decision = match conflict::check(store, &identity, groups, claimed) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(reference, username = %identity.username, error = %e, "directory lookup failed");
                return Ok(RecordReport::new(
                    reference,
                    username,
                    ProvisioningOutcome::Failed(FailureReason::Lookup {
                        error: e.to_string(),
                    }),
                ));
            }
        };

        let groups = match decision {
            ConflictDecision::Proceed(groups) => groups,
            ConflictDecision::SkipExisting => {
                tracing::warn!(reference, username = %identity.username, "User {} already exists, skipping import", identity.username);
                return Ok(RecordReport::new(reference, username, ProvisioningOutcome::SkippedExisting));
            }
            ConflictDecision::Skip(reason) => {
                tracing::warn!(reference, username = %identity.username, %reason, "skipping record");
                return Ok(RecordReport::new(
                    reference,
                    username,
                    ProvisioningOutcome::SkippedConflict(reason),
                ));
            }
            ConflictDecision::MissingGroups(missing) => {
                if self.profile.on_missing_prerequisite == MissingGroupPolicy::Abort {
                    return Err(self.abort(record, missing));
                }
                tracing::error!(reference, groups = ?missing, "group(s) don't exist, skipping record");
                return Ok(RecordReport::new(
                    reference,
                    username,
                    ProvisioningOutcome::Failed(FailureReason::MissingGroup { groups: missing }),
                ));
            }
        };

        claimed.insert(identity.username.clone(), reference.to_string());

        if self.settings.dry_run {
            tracing::info!(reference, username = %identity.username, "would create user");
            return Ok(RecordReport::new(reference, username, ProvisioningOutcome::WouldCreate));
        }

        let ctx = ExecutionContext {
            language: &self.settings.language,
            org_description: record.org_display_name().filter(|d| !d.trim().is_empty()),
        };
        let result = executor::execute(store, &identity, &groups, ctx);

        let outcome = match &result.failure {
            None => {
                tracing::info!(reference, username = %identity.username, "user created");
                progress.line(&format!("User {} created", identity.username));
                ProvisioningOutcome::Created
            }
            Some((step, e)) => ProvisioningOutcome::Failed(FailureReason::Step {
                step: step.to_string(),
                error: e.to_string(),
            }),
        };

        let mut report = RecordReport::new(reference, username, outcome);
        report.account_persisted = result.account_persisted();
        if report.account_persisted {
            if let Some(user) = &result.user {
                report.notification = notify::dispatch(
                    notifier,
                    self.settings.send_notifications,
                    &self.profile.template,
                    user,
                );
                if report.notification == NotificationStatus::Sent {
                    progress.line(&format!("User {} mailed", identity.username));
                }
            }
        }
        report.steps = result.steps;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContactName;
    use crate::source::SourceKind;
    use rollcall_directory::{MemoryDirectory, RecordingNotifier};

    fn mentor(first: &str, last: &str, line: usize) -> ProvisioningRecord {
        ProvisioningRecord::unaffiliated(
            ContactName::Split {
                first: first.into(),
                last: last.into(),
            },
            format!("{}@example.com", first.to_lowercase()),
            format!("line {line}"),
        )
    }

    fn batch(records: Vec<ProvisioningRecord>) -> SourceBatch {
        let mut batch = SourceBatch::new(SourceKind::Mentors);
        batch.records = records;
        batch
    }

    fn engine() -> Engine {
        Engine::new(
            SourceProfile::defaults(SourceKind::Mentors),
            EngineSettings::default(),
        )
    }

    #[test]
    fn progress_lines_for_created_and_mailed() {
        let mut dir = MemoryDirectory::with_groups(["mentors"]);
        let mut notifier = RecordingNotifier::new();
        let mut lines: Vec<String> = Vec::new();
        engine()
            .run(batch(vec![mentor("Jane", "Doe", 1)]), &mut dir, &mut notifier, &mut lines)
            .unwrap();
        assert_eq!(lines, ["User jdoe created", "User jdoe mailed"]);
    }

    #[test]
    fn missing_role_group_aborts_before_anything() {
        let mut dir = MemoryDirectory::new();
        let err = engine()
            .run(
                batch(vec![mentor("Jane", "Doe", 1)]),
                &mut dir,
                &mut RecordingNotifier::new(),
                &mut SilentProgress,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::MissingPrerequisiteGroup { ref group, reference: None } if group == "mentors"
        ));
        assert_eq!(dir.user_count(), 0);
    }

    #[test]
    fn dry_run_mutates_nothing_but_detects_collisions() {
        let mut dir = MemoryDirectory::with_groups(["mentors"]);
        let mut notifier = RecordingNotifier::new();
        let settings = EngineSettings {
            dry_run: true,
            ..EngineSettings::default()
        };
        let report = Engine::new(SourceProfile::defaults(SourceKind::Mentors), settings)
            .run(
                batch(vec![mentor("Jane", "Doe", 1), mentor("John", "Doe", 2)]),
                &mut dir,
                &mut notifier,
                &mut SilentProgress,
            )
            .unwrap();
        assert_eq!(report.would_create(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.summary_line(), "Would create 1 and skip 1 more");
        assert_eq!(dir.user_count(), 0);
        assert!(notifier.sent.is_empty());
    }
}
