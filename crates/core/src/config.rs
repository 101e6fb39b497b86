//! Import configuration.
//!
//! Every setting has a built-in default, so the TOML file is optional and
//! may override as little as one key.
//!
//! # Example
//!
//! ```toml
//! language = "english"
//! send_notifications = true
//!
//! [groups]
//! organization_prefix = ""
//! team_prefix = ""
//!
//! [profiles.schools]
//! role_group = "teachers"
//! template = "teacher_welcome"
//! on_missing_prerequisite = "skip-record"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;
use crate::identity::{GroupNaming, UsernameConvention};
use crate::source::SourceKind;
use crate::validate::ValidationRules;

pub const DEFAULT_LANGUAGE: &str = "english";

// ── Types ─────────────────────────────────────────────────────────────────────

/// What to do when none of a record's organization/team groups exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingGroupPolicy {
    /// Stop the whole run before any account is created.
    Abort,
    /// Record the failure and continue with the next record.
    SkipRecord,
}

/// Everything the engine needs to know about one source kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProfile {
    pub kind: SourceKind,
    /// Group every record of this kind joins. Must exist before the run.
    pub role_group: String,
    /// Notification template for new accounts.
    pub template: String,
    pub convention: UsernameConvention,
    pub on_missing_prerequisite: MissingGroupPolicy,
    pub rules: ValidationRules,
}

impl SourceProfile {
    /// Built-in profile for `kind`.
    pub fn defaults(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Teams => SourceProfile {
                kind,
                role_group: "teachers".to_string(),
                template: "teacher_welcome".to_string(),
                convention: UsernameConvention::TeamLeader,
                on_missing_prerequisite: MissingGroupPolicy::Abort,
                rules: ValidationRules {
                    require_organization: true,
                    require_display_name: false,
                },
            },
            SourceKind::Schools => SourceProfile {
                kind,
                role_group: "teachers".to_string(),
                template: "teacher_welcome".to_string(),
                convention: UsernameConvention::TeamLeader,
                on_missing_prerequisite: MissingGroupPolicy::SkipRecord,
                rules: ValidationRules {
                    require_organization: true,
                    require_display_name: true,
                },
            },
            SourceKind::Mentors => SourceProfile {
                kind,
                role_group: "mentors".to_string(),
                template: "mentor-welcome".to_string(),
                convention: UsernameConvention::Mentor,
                on_missing_prerequisite: MissingGroupPolicy::SkipRecord,
                rules: ValidationRules::default(),
            },
        }
    }
}

/// `[profiles.<kind>]` — overrides for one source kind. Unset keys keep the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverrides {
    pub role_group: Option<String>,
    pub template: Option<String>,
    pub convention: Option<UsernameConvention>,
    pub on_missing_prerequisite: Option<MissingGroupPolicy>,
}

/// `[profiles]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profiles {
    pub teams: ProfileOverrides,
    pub schools: ProfileOverrides,
    pub mentors: ProfileOverrides,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Language written onto every new account.
    pub language: String,
    pub send_notifications: bool,
    pub groups: GroupNaming,
    pub profiles: Profiles,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            language: DEFAULT_LANGUAGE.to_string(),
            send_notifications: true,
            groups: GroupNaming::default(),
            profiles: Profiles::default(),
        }
    }
}

impl Config {
    /// The effective profile for `kind`: built-in defaults with overrides applied.
    pub fn profile(&self, kind: SourceKind) -> SourceProfile {
        let overrides = match kind {
            SourceKind::Teams => &self.profiles.teams,
            SourceKind::Schools => &self.profiles.schools,
            SourceKind::Mentors => &self.profiles.mentors,
        };
        let mut profile = SourceProfile::defaults(kind);
        if let Some(role_group) = &overrides.role_group {
            profile.role_group = role_group.clone();
        }
        if let Some(template) = &overrides.template {
            profile.template = template.clone();
        }
        if let Some(convention) = overrides.convention {
            profile.convention = convention;
        }
        if let Some(policy) = overrides.on_missing_prerequisite {
            profile.on_missing_prerequisite = policy;
        }
        profile
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a configuration file.
pub fn load_config(path: &Path) -> Result<Config, ProvisionError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ProvisionError::Config(format!("could not read '{}': {}", path.display(), e))
    })?;
    parse_config(&content)
        .map_err(|e| ProvisionError::Config(format!("could not parse '{}': {}", path.display(), e)))
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}
