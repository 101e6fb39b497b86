use super::{persisted_user, CheckResult, SEED_GROUPS};
use crate::{DirectoryError, DirectoryStore};

pub(super) fn run_group_checks<S, F>(factory: &F) -> Vec<CheckResult>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    vec![
        CheckResult::from_result(
            "group",
            "seeded_groups_exist",
            seeded_groups_exist(factory),
        ),
        CheckResult::from_result(
            "group",
            "lookup_never_creates",
            lookup_never_creates(factory),
        ),
        CheckResult::from_result(
            "group",
            "membership_persists_after_save",
            membership_persists_after_save(factory),
        ),
        CheckResult::from_result(
            "group",
            "unsaved_membership_not_visible",
            unsaved_membership_not_visible(factory),
        ),
        CheckResult::from_result(
            "group",
            "adding_member_twice_is_noop",
            adding_member_twice_is_noop(factory),
        ),
        CheckResult::from_result(
            "group",
            "description_persists_after_save",
            description_persists_after_save(factory),
        ),
    ]
}

fn seeded_groups_exist<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let s = factory();
    for name in SEED_GROUPS {
        if !s.group_exists(name).map_err(|e| e.to_string())? {
            return Err(format!("seed group {name} missing"));
        }
    }
    Ok(())
}

fn lookup_never_creates<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let s = factory();
    match s.group("conformance-absent") {
        Err(DirectoryError::GroupNotFound { name }) if name == "conformance-absent" => {}
        Err(other) => return Err(format!("expected GroupNotFound, got {other}")),
        Ok(_) => return Err("lookup of absent group succeeded".to_string()),
    }
    if s.group_exists("conformance-absent").map_err(|e| e.to_string())? {
        return Err("failed lookup created the group".to_string());
    }
    Ok(())
}

fn membership_persists_after_save<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let user = persisted_user(&mut s, "ghopper")?;
    let mut group = s.group(SEED_GROUPS[0]).map_err(|e| e.to_string())?;
    s.group_add_member(&mut group, &user)
        .map_err(|e| e.to_string())?;
    s.group_save(&group).map_err(|e| e.to_string())?;

    let reread = s.group(SEED_GROUPS[0]).map_err(|e| e.to_string())?;
    if !reread.has_member("ghopper") {
        return Err("member missing after group_save".to_string());
    }
    Ok(())
}

fn unsaved_membership_not_visible<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let user = persisted_user(&mut s, "ghopper")?;
    let mut group = s.group(SEED_GROUPS[1]).map_err(|e| e.to_string())?;
    s.group_add_member(&mut group, &user)
        .map_err(|e| e.to_string())?;

    let reread = s.group(SEED_GROUPS[1]).map_err(|e| e.to_string())?;
    if reread.has_member("ghopper") {
        return Err("membership visible before group_save".to_string());
    }
    Ok(())
}

fn adding_member_twice_is_noop<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let user = persisted_user(&mut s, "ghopper")?;
    for _ in 0..2 {
        let mut group = s.group(SEED_GROUPS[0]).map_err(|e| e.to_string())?;
        s.group_add_member(&mut group, &user)
            .map_err(|e| e.to_string())?;
        s.group_save(&group).map_err(|e| e.to_string())?;
    }
    let members = s
        .group(SEED_GROUPS[0])
        .map_err(|e| e.to_string())?
        .members;
    if members.len() != 1 {
        return Err(format!("expected 1 member, got {}", members.len()));
    }
    Ok(())
}

fn description_persists_after_save<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let mut group = s.group(SEED_GROUPS[0]).map_err(|e| e.to_string())?;
    s.group_set_description(&mut group, "Conformance College")
        .map_err(|e| e.to_string())?;
    s.group_save(&group).map_err(|e| e.to_string())?;

    let reread = s.group(SEED_GROUPS[0]).map_err(|e| e.to_string())?;
    if reread.description.as_deref() != Some("Conformance College") {
        return Err(format!("description not persisted: {:?}", reread.description));
    }
    Ok(())
}
