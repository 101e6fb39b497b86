use super::CheckResult;
use crate::DirectoryStore;

pub(super) fn run_naming_checks<S, F>(factory: &F) -> Vec<CheckResult>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    vec![
        CheckResult::from_result(
            "naming",
            "derive_username_is_deterministic",
            derive_username_is_deterministic(factory),
        ),
        CheckResult::from_result(
            "naming",
            "derive_username_depends_on_org",
            derive_username_depends_on_org(factory),
        ),
        CheckResult::from_result(
            "naming",
            "derive_username_ignores_store_contents",
            derive_username_ignores_store_contents(factory),
        ),
    ]
}

fn derive_username_is_deterministic<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let a = factory().derive_username("ABC", "Jane", "Doe");
    let b = factory().derive_username("ABC", "Jane", "Doe");
    if a != b {
        return Err(format!("same inputs gave {a} and {b}"));
    }
    if a.is_empty() {
        return Err("derived username is empty".to_string());
    }
    Ok(())
}

fn derive_username_depends_on_org<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let s = factory();
    let a = s.derive_username("ABC", "Jane", "Doe");
    let b = s.derive_username("XYZ", "Jane", "Doe");
    if a == b {
        return Err(format!("different organizations both gave {a}"));
    }
    Ok(())
}

/// Existing accounts must not change the result: collisions are the caller's
/// concern, detected through `user_exists`.
fn derive_username_ignores_store_contents<S, F>(factory: &F) -> Result<(), String>
where
    S: DirectoryStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let before = s.derive_username("ABC", "Jane", "Doe");
    let user = s.create_user(&before).map_err(|e| e.to_string())?;
    s.save(&user).map_err(|e| e.to_string())?;
    let after = s.derive_username("ABC", "Jane", "Doe");
    if before != after {
        return Err(format!("derivation changed from {before} to {after} after save"));
    }
    Ok(())
}
