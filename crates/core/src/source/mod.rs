//! Record source adapters.
//!
//! Each adapter reads one input shape and normalizes it into
//! [`ProvisioningRecord`]s:
//!
//! - [`teams`] — a directory of per-organization YAML files
//! - [`tabular`] — CSV files of mentors or schools
//!
//! Adapters never stop at the first problem in an entity; every structural
//! error is collected in [`SourceBatch::errors`], keyed by file name or line.
//! Only an input that cannot be opened at all is returned as `Err`.

pub mod tabular;
pub mod teams;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, SourceError};
use crate::record::ProvisioningRecord;

/// The supported input shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Directory of `<TLA>.yaml` team files; one team leader per organization.
    Teams,
    /// CSV with `tla, organisation_name, first_name, last_name, email`.
    Schools,
    /// CSV with `first_name, last_name, email`.
    Mentors,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Teams => "teams",
            SourceKind::Schools => "schools",
            SourceKind::Mentors => "mentors",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an adapter produced from one input.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub kind: SourceKind,
    pub records: Vec<ProvisioningRecord>,
    pub errors: Vec<SourceError>,
    /// References of entities not taking part this cycle. Not errors.
    pub excluded: Vec<String>,
}

impl SourceBatch {
    pub fn new(kind: SourceKind) -> Self {
        SourceBatch {
            kind,
            records: Vec::new(),
            errors: Vec::new(),
            excluded: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read `path` with the adapter for `kind`.
pub fn read_source(kind: SourceKind, path: &Path) -> Result<SourceBatch, ProvisionError> {
    match kind {
        SourceKind::Teams => teams::read_team_directory(path),
        SourceKind::Schools => tabular::read_schools(path),
        SourceKind::Mentors => tabular::read_mentors(path),
    }
}

/// Wrap a single unreadable-input problem as a batch-level error.
pub(crate) fn unreadable(path: &Path, message: impl Into<String>) -> ProvisionError {
    ProvisionError::StructuralInput(vec![SourceError::new(
        path.display().to_string(),
        message,
    )])
}
