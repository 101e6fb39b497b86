//! rollcall-core: bulk account provisioning from roster files.
//!
//! A run reads one source into [`ProvisioningRecord`]s, validates the whole
//! batch, then creates each account in a [`DirectoryStore`], attaches it to
//! its groups and sends a welcome message through a [`Notifier`].
//!
//! # Public API
//!
//! - [`read_source`] -- run the adapter for a [`SourceKind`]
//! - [`Engine`] -- validate and provision a [`SourceBatch`]
//! - [`RunReport`] -- per-record outcomes and the summary counts
//! - [`Config`] -- TOML settings and per-kind [`SourceProfile`]s
//! - [`ProvisionError`] -- errors that abort a whole run
//!
//! [`DirectoryStore`]: rollcall_directory::DirectoryStore
//! [`Notifier`]: rollcall_directory::Notifier

pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod executor;
pub mod identity;
pub mod notify;
pub mod outcome;
pub mod record;
pub mod source;
pub mod validate;

// ── Convenience re-exports ────────────────────────────────────────────

pub use config::{load_config, Config, MissingGroupPolicy, SourceProfile};
pub use engine::{Engine, EngineSettings, Progress, SilentProgress, StdoutProgress};
pub use error::{ProvisionError, SourceError};
pub use identity::{AccountIdentity, GroupNaming, UsernameConvention};
pub use outcome::{
    ConflictReason, FailureReason, NotificationStatus, ProvisioningOutcome, RecordReport,
    RunReport,
};
pub use record::{ContactName, ProvisioningRecord};
pub use source::{read_source, SourceBatch, SourceKind};
pub use validate::{ValidationError, ValidationRules};
