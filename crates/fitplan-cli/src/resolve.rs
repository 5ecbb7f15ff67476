//! Resolution of command-line references to plans and users.
//!
//! - [`resolve_plan_id`] accepts either a UUID string or a path to a plan
//!   TOML file carrying `[plan].id` (as written by `fitplan plan export`).
//! - [`resolve_user`] accepts a UUID, an email address or a username.

use std::path::Path;

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use fitplan_db::models::User;
use fitplan_db::queries::users;

/// Heuristic: if the string ends with `.toml`, contains a path separator,
/// or names a file that exists on disk, treat it as a file path. Otherwise,
/// parse it as a UUID.
pub fn resolve_plan_id(input: &str) -> Result<Uuid> {
    if looks_like_file_path(input) {
        return read_plan_id_from_file(input);
    }
    match Uuid::parse_str(input) {
        Ok(uuid) => Ok(uuid),
        Err(_) if Path::new(input).is_file() => read_plan_id_from_file(input),
        Err(e) => Err(e)
            .with_context(|| format!("invalid plan ID: {input:?} (not a valid UUID and not a file)")),
    }
}

fn looks_like_file_path(input: &str) -> bool {
    input.ends_with(".toml") || input.contains('/')
}

fn read_plan_id_from_file(path: &str) -> Result<Uuid> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file: {path}"))?;

    let plan_toml: fitplan_core::plan::PlanToml =
        toml::from_str(&content).with_context(|| format!("failed to parse TOML from {path}"))?;

    match plan_toml.plan.id {
        Some(id) => Ok(id),
        None => bail!(
            "plan file {path:?} has no id field in [plan] section.\n\
             Use the plan ID printed by `fitplan plan create {path}`."
        ),
    }
}

/// Look up a user by id, email or username.
pub async fn resolve_user(pool: &PgPool, input: &str) -> Result<User> {
    let found = match Uuid::parse_str(input) {
        Ok(id) => users::get_user(pool, id).await?,
        Err(_) => users::find_user(pool, input).await?,
    };
    found.with_context(|| format!("user {input:?} not found"))
}
