use std::fmt;

use rollcall_directory::DirectoryError;
use serde::Serialize;

use crate::validate::ValidationError;

/// A structural problem with the input: unreadable or malformed source,
/// missing required key, wrong identifier format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceError {
    /// File name or `line N` the problem was found in.
    pub reference: String,
    pub message: String,
}

impl SourceError {
    pub fn new(reference: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reference, self.message)
    }
}

/// Errors that invalidate the whole batch. Nothing scoped to a single record
/// is reported through this type; those end up in the run report.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The input could not be read or does not have the expected shape.
    #[error("{} structural input error(s)", .0.len())]
    StructuralInput(Vec<SourceError>),

    /// One or more records failed validation. No mutation was performed.
    #[error("{} validation error(s); no accounts were created", .0.len())]
    Validation(Vec<ValidationError>),

    /// A group every record depends on is absent.
    #[error("Group {group} doesn't exist")]
    MissingPrerequisiteGroup {
        group: String,
        /// The record that hit the missing group, when the abort was triggered
        /// by a record rather than by the up-front role-group check.
        reference: Option<String>,
    },

    /// The directory failed outside of any single record's mutation sequence.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProvisionError {
    /// One human-readable line per underlying problem.
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            ProvisionError::StructuralInput(errors) => {
                errors.iter().map(ToString::to_string).collect()
            }
            ProvisionError::Validation(errors) => {
                errors.iter().map(ToString::to_string).collect()
            }
            ProvisionError::MissingPrerequisiteGroup {
                group,
                reference: Some(reference),
            } => vec![format!("{reference}: Group {group} doesn't exist")],
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_diagnostics_list_every_error() {
        let err = ProvisionError::StructuralInput(vec![
            SourceError::new("ABC.yaml", "No contacts record for ABC.yaml"),
            SourceError::new("XYZ.yaml", "No teams record for XYZ.yaml"),
        ]);
        let lines = err.diagnostics();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ABC.yaml: No contacts record for ABC.yaml");
    }

    #[test]
    fn missing_group_names_the_record() {
        let err = ProvisionError::MissingPrerequisiteGroup {
            group: "ABC".into(),
            reference: Some("ABC.yaml".into()),
        };
        assert_eq!(err.diagnostics(), vec!["ABC.yaml: Group ABC doesn't exist"]);
    }
}
