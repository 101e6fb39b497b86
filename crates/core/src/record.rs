use serde::Serialize;

/// A contact's name as supplied by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContactName {
    /// A single free-text name; split into first/last during identity resolution.
    Full(String),
    /// Already split by the source (separate columns). Never re-split.
    Split { first: String, last: String },
}

/// One person to provision, normalized from any input source.
///
/// Immutable once constructed. For organization-bearing sources
/// `group_identifiers` is non-empty and its first element equals
/// `org_identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningRecord {
    contact_name: ContactName,
    contact_email: String,
    org_identifier: Option<String>,
    org_display_name: Option<String>,
    group_identifiers: Vec<String>,
    source_reference: String,
}

impl ProvisioningRecord {
    /// A record affiliated with an organization. The organization identifier
    /// is the first group identifier.
    pub fn for_organization(
        contact_name: ContactName,
        contact_email: impl Into<String>,
        group_identifiers: Vec<String>,
        org_display_name: Option<String>,
        source_reference: impl Into<String>,
    ) -> Self {
        ProvisioningRecord {
            contact_name,
            contact_email: contact_email.into(),
            org_identifier: group_identifiers.first().cloned(),
            org_display_name,
            group_identifiers,
            source_reference: source_reference.into(),
        }
    }

    /// A record with no organization (e.g. a mentor who only joins a role group).
    pub fn unaffiliated(
        contact_name: ContactName,
        contact_email: impl Into<String>,
        source_reference: impl Into<String>,
    ) -> Self {
        ProvisioningRecord {
            contact_name,
            contact_email: contact_email.into(),
            org_identifier: None,
            org_display_name: None,
            group_identifiers: Vec::new(),
            source_reference: source_reference.into(),
        }
    }

    pub fn contact_name(&self) -> &ContactName {
        &self.contact_name
    }

    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    pub fn org_identifier(&self) -> Option<&str> {
        self.org_identifier.as_deref()
    }

    pub fn org_display_name(&self) -> Option<&str> {
        self.org_display_name.as_deref()
    }

    pub fn group_identifiers(&self) -> &[String] {
        &self.group_identifiers
    }

    pub fn source_reference(&self) -> &str {
        &self.source_reference
    }
}
