use super::{persisted_user, sample_fields, CheckResult};
use crate::{DirectoryError, DirectoryStore};

pub(super) fn run_user_checks<S, F>(factory: &F) -> Vec<CheckResult>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    vec![
        CheckResult::from_result(
            "user",
            "unknown_user_does_not_exist",
            unknown_user_does_not_exist(factory),
        ),
        CheckResult::from_result(
            "user",
            "created_user_invisible_until_saved",
            created_user_invisible_until_saved(factory),
        ),
        CheckResult::from_result(
            "user",
            "saved_fields_read_back",
            saved_fields_read_back(factory),
        ),
        CheckResult::from_result(
            "user",
            "persisted_username_cannot_be_created_again",
            persisted_username_cannot_be_created_again(factory),
        ),
        CheckResult::from_result(
            "user",
            "unknown_user_lookup_is_not_found",
            unknown_user_lookup_is_not_found(factory),
        ),
        CheckResult::from_result(
            "user",
            "initial_credential_is_issued",
            initial_credential_is_issued(factory),
        ),
    ]
}

fn unknown_user_does_not_exist<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let s = factory();
    if s.user_exists("nobody").map_err(|e| e.to_string())? {
        return Err("user_exists returned true on an empty store".to_string());
    }
    Ok(())
}

fn created_user_invisible_until_saved<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let mut user = s.create_user("ghopper").map_err(|e| e.to_string())?;
    if s.user_exists("ghopper").map_err(|e| e.to_string())? {
        return Err("user visible before save".to_string());
    }
    s.set_fields(&mut user, &sample_fields())
        .map_err(|e| e.to_string())?;
    s.save(&user).map_err(|e| e.to_string())?;
    if !s.user_exists("ghopper").map_err(|e| e.to_string())? {
        return Err("user not visible after save".to_string());
    }
    Ok(())
}

fn saved_fields_read_back<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    persisted_user(&mut s, "ghopper")?;
    let stored = s.user("ghopper").map_err(|e| e.to_string())?;
    let expected = sample_fields();
    if stored.first_name != expected.first_name
        || stored.last_name != expected.last_name
        || stored.email != expected.email
    {
        return Err(format!("stored fields differ: {stored:?}"));
    }
    if stored.language.as_deref() != Some(expected.language.as_str()) {
        return Err(format!("expected language {}, got {:?}", expected.language, stored.language));
    }
    Ok(())
}

fn persisted_username_cannot_be_created_again<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    persisted_user(&mut s, "ghopper")?;
    match s.create_user("ghopper") {
        Err(DirectoryError::UserExists { username }) if username == "ghopper" => Ok(()),
        Err(other) => Err(format!("expected UserExists, got {other}")),
        Ok(_) => Err("create_user succeeded for a persisted username".to_string()),
    }
}

fn unknown_user_lookup_is_not_found<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let s = factory();
    match s.user("nobody") {
        Err(DirectoryError::UserNotFound { .. }) => Ok(()),
        Err(other) => Err(format!("expected UserNotFound, got {other}")),
        Ok(_) => Err("lookup of unknown user succeeded".to_string()),
    }
}

fn initial_credential_is_issued<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let user = s.create_user("ghopper").map_err(|e| e.to_string())?;
    if user.initial_password.is_empty() {
        return Err("create_user issued an empty credential".to_string());
    }
    Ok(())
}
