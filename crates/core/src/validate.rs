//! Batch validation gate.
//!
//! Every record is checked and every violation is collected before the
//! caller decides anything. A non-empty error list means the batch must not
//! be applied at all.

use std::fmt;

use serde::Serialize;

use crate::record::{ContactName, ProvisioningRecord};

/// What the source profile requires of each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationRules {
    /// Records must carry a conventional organization identifier and at least one group.
    pub require_organization: bool,
    /// Records must carry a non-blank organization display name.
    pub require_display_name: bool,
}

/// The kind of a single violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A required field is absent or blank.
    MissingField { field: String },
    /// The email has no `@`.
    InvalidEmail { email: String },
    /// The organization identifier is not uppercase letters only.
    InvalidOrgIdentifier { identifier: String },
    /// No group identifiers at all.
    NoGroups,
}

/// One violation, attributed to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub reference: String,
    #[serde(flatten)]
    pub violation: Violation,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.violation {
            Violation::MissingField { field } => {
                write!(f, "{} is missing a {}", self.reference, field)
            }
            Violation::InvalidEmail { email } => {
                write!(f, "Invalid email {:?} on {}", email, self.reference)
            }
            Violation::InvalidOrgIdentifier { identifier } => write!(
                f,
                "{}: organisation identifier {:?} is not the conventional format",
                self.reference, identifier
            ),
            Violation::NoGroups => write!(f, "{} has no teams", self.reference),
        }
    }
}

/// Whether `s` is a conventional organization identifier: one or more
/// uppercase ASCII letters.
pub fn is_org_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase())
}

/// Validate every record. Returns the records that passed and every violation found.
pub fn validate(
    records: Vec<ProvisioningRecord>,
    rules: ValidationRules,
) -> (Vec<ProvisioningRecord>, Vec<ValidationError>) {
    let mut valid = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for record in records {
        let found = check_record(&record, rules);
        if found.is_empty() {
            valid.push(record);
        } else {
            errors.extend(found);
        }
    }
    (valid, errors)
}

fn check_record(record: &ProvisioningRecord, rules: ValidationRules) -> Vec<ValidationError> {
    let mut violations = Vec::new();
    let missing = |field: &str| Violation::MissingField {
        field: field.to_string(),
    };

    match record.contact_name() {
        ContactName::Full(name) => {
            if is_blank(name) {
                violations.push(missing("name"));
            }
        }
        ContactName::Split { first, last } => {
            if is_blank(first) {
                violations.push(missing("first_name"));
            }
            if is_blank(last) {
                violations.push(missing("last_name"));
            }
        }
    }

    let email = record.contact_email();
    if is_blank(email) {
        violations.push(missing("email"));
    } else if !email.contains('@') {
        violations.push(Violation::InvalidEmail {
            email: email.to_string(),
        });
    }

    if rules.require_organization {
        match record.org_identifier() {
            None => violations.push(missing("tla")),
            Some(id) if is_blank(id) => violations.push(missing("tla")),
            Some(id) if !is_org_identifier(id) => {
                violations.push(Violation::InvalidOrgIdentifier {
                    identifier: id.to_string(),
                })
            }
            Some(_) => {}
        }
        if record.group_identifiers().is_empty() {
            violations.push(Violation::NoGroups);
        }
    }

    if rules.require_display_name && record.org_display_name().map_or(true, is_blank) {
        violations.push(missing("organisation_name"));
    }

    violations
        .into_iter()
        .map(|violation| ValidationError {
            reference: record.source_reference().to_string(),
            violation,
        })
        .collect()
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORG_RULES: ValidationRules = ValidationRules {
        require_organization: true,
        require_display_name: true,
    };

    fn school(tla: &str, name: &str, first: &str, last: &str, email: &str, line: usize) -> ProvisioningRecord {
        ProvisioningRecord::for_organization(
            ContactName::Split {
                first: first.into(),
                last: last.into(),
            },
            email,
            vec![tla.into()],
            Some(name.into()),
            format!("line {line}"),
        )
    }

    #[test]
    fn org_identifier_pattern() {
        assert!(is_org_identifier("ABC"));
        assert!(!is_org_identifier(""));
        assert!(!is_org_identifier("ABC1"));
        assert!(!is_org_identifier("AbC"));
        assert!(!is_org_identifier("ÅBC"));
    }

    #[test]
    fn clean_batch_passes_through() {
        let records = vec![school("ABC", "Example", "Jane", "Doe", "jane@example.com", 1)];
        let (valid, errors) = validate(records, ORG_RULES);
        assert_eq!(valid.len(), 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn collects_every_violation_across_every_record() {
        let records = vec![
            school("ABC", "", "", "Doe", "jane.example.com", 1),
            school("ABC", "Fine", "John", "Roe", "john@example.com", 2),
            school("", "Example", "Ann", "", "", 3),
        ];
        let (valid, errors) = validate(records, ORG_RULES);
        assert_eq!(valid.len(), 1);
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            [
                "line 1 is missing a first_name",
                "Invalid email \"jane.example.com\" on line 1",
                "line 1 is missing a organisation_name",
                "line 3 is missing a last_name",
                "line 3 is missing a email",
                "line 3 is missing a tla",
            ]
        );
    }

    #[test]
    fn lowercase_org_identifier_is_rejected() {
        let (_, errors) = validate(vec![school("abc1", "X", "A", "B", "a@b", 1)], ORG_RULES);
        assert_eq!(
            errors[0].violation,
            Violation::InvalidOrgIdentifier {
                identifier: "abc1".into()
            }
        );
    }

    #[test]
    fn unaffiliated_records_skip_organization_checks() {
        let record = ProvisioningRecord::unaffiliated(
            ContactName::Split {
                first: "Ada".into(),
                last: "Lovelace".into(),
            },
            "ada@example.com",
            "line 1",
        );
        let (valid, errors) = validate(vec![record], ValidationRules::default());
        assert_eq!(valid.len(), 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn blank_full_name_is_missing() {
        let record = ProvisioningRecord::for_organization(
            ContactName::Full("   ".into()),
            "x@example.com",
            vec!["ABC".into()],
            None,
            "ABC.yaml",
        );
        let rules = ValidationRules {
            require_organization: true,
            require_display_name: false,
        };
        let (_, errors) = validate(vec![record], rules);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "ABC.yaml is missing a name");
    }
}
