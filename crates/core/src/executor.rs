//! Apply one record's mutations to the directory.
//!
//! Steps run in a fixed order: create the account, save it, then attach it
//! to the organization group, each team group and finally the role group.
//! Each step persists on its own. When one fails the remaining steps are
//! skipped but nothing already persisted is rolled back; the returned
//! [`ExecutionResult`] says exactly how far the sequence got.

use std::fmt;

use serde::Serialize;

use rollcall_directory::{AccountFields, DirectoryError, DirectoryStore, UserHandle};

use crate::identity::{AccountIdentity, GroupKind, ResolvedGroups};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", content = "group", rename_all = "snake_case")]
pub enum ProvisionStep {
    CreateAccount,
    SaveAccount,
    AttachOrganization(String),
    AttachTeam(String),
    AttachRole(String),
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionStep::CreateAccount => write!(f, "create account"),
            ProvisionStep::SaveAccount => write!(f, "save account"),
            ProvisionStep::AttachOrganization(g) => write!(f, "attach to organisation group {g}"),
            ProvisionStep::AttachTeam(g) => write!(f, "attach to team group {g}"),
            ProvisionStep::AttachRole(g) => write!(f, "attach to role group {g}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum StepStatus {
    Done,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    #[serde(flatten)]
    pub step: ProvisionStep,
    pub result: StepStatus,
}

/// How far a record's mutation sequence got.
#[derive(Debug)]
pub struct ExecutionResult {
    pub steps: Vec<StepRecord>,
    /// The account handle, once created. Carries the issued credential.
    pub user: Option<UserHandle>,
    /// The first failing step and its error.
    pub failure: Option<(ProvisionStep, DirectoryError)>,
}

impl ExecutionResult {
    /// Whether the account itself reached the directory.
    pub fn account_persisted(&self) -> bool {
        self.steps
            .iter()
            .any(|s| s.step == ProvisionStep::SaveAccount && s.result == StepStatus::Done)
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// The ordered steps for `groups`. A group name is attached once even when
/// the organization group and the primary team group coincide.
pub fn plan(groups: &ResolvedGroups) -> Vec<ProvisionStep> {
    let mut steps = vec![ProvisionStep::CreateAccount, ProvisionStep::SaveAccount];
    let mut seen: Vec<&str> = Vec::new();
    for group in groups.affiliation().chain(std::iter::once(&groups.role)) {
        if seen.contains(&group.name.as_str()) {
            continue;
        }
        seen.push(&group.name);
        let name = group.name.clone();
        steps.push(match group.kind {
            GroupKind::Organization => ProvisionStep::AttachOrganization(name),
            GroupKind::Team => ProvisionStep::AttachTeam(name),
            GroupKind::Role => ProvisionStep::AttachRole(name),
        });
    }
    steps
}

/// Fields not derived from the record itself.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub language: &'a str,
    /// Written as the organization group's description when present.
    pub org_description: Option<&'a str>,
}

/// Run every step of [`plan`] against `store`.
pub fn execute<D: DirectoryStore + ?Sized>(
    store: &mut D,
    identity: &AccountIdentity,
    groups: &ResolvedGroups,
    ctx: ExecutionContext<'_>,
) -> ExecutionResult {
    let mut result = ExecutionResult {
        steps: Vec::new(),
        user: None,
        failure: None,
    };

    for step in plan(groups) {
        if result.failure.is_some() {
            result.steps.push(StepRecord {
                step,
                result: StepStatus::Skipped,
            });
            continue;
        }

        match apply_step(store, &step, identity, &mut result.user, ctx) {
            Ok(()) => {
                tracing::debug!(username = %identity.username, %step, "step done");
                result.steps.push(StepRecord {
                    step,
                    result: StepStatus::Done,
                });
            }
            Err(e) => {
                tracing::error!(username = %identity.username, %step, error = %e, "step failed");
                result.steps.push(StepRecord {
                    step: step.clone(),
                    result: StepStatus::Failed(e.to_string()),
                });
                result.failure = Some((step, e));
            }
        }
    }
    result
}

fn apply_step<D: DirectoryStore + ?Sized>(
    store: &mut D,
    step: &ProvisionStep,
    identity: &AccountIdentity,
    user: &mut Option<UserHandle>,
    ctx: ExecutionContext<'_>,
) -> Result<(), DirectoryError> {
    match step {
        ProvisionStep::CreateAccount => {
            let mut handle = store.create_user(&identity.username)?;
            store.set_fields(
                &mut handle,
                &AccountFields {
                    first_name: identity.first_name.clone(),
                    last_name: identity.last_name.clone(),
                    email: identity.email.clone(),
                    language: ctx.language.to_string(),
                },
            )?;
            *user = Some(handle);
            Ok(())
        }
        ProvisionStep::SaveAccount => store.save(created(user)?),
        ProvisionStep::AttachOrganization(name) => {
            attach(store, name, created(user)?, ctx.org_description)
        }
        ProvisionStep::AttachTeam(name) | ProvisionStep::AttachRole(name) => {
            attach(store, name, created(user)?, None)
        }
    }
}

fn created(user: &Option<UserHandle>) -> Result<&UserHandle, DirectoryError> {
    user.as_ref()
        .ok_or_else(|| DirectoryError::Backend("account was not created".to_string()))
}

fn attach<D: DirectoryStore + ?Sized>(
    store: &mut D,
    name: &str,
    user: &UserHandle,
    description: Option<&str>,
) -> Result<(), DirectoryError> {
    let mut group = store.group(name)?;
    store.group_add_member(&mut group, user)?;
    if let Some(text) = description {
        store.group_set_description(&mut group, text)?;
    }
    store.group_save(&group)
}
