//! Database query functions for the `plans` table.

use anyhow::{Context, Result, bail};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::Plan;

#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub duration_weeks: i32,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
}

pub async fn insert_plan(db: impl PgExecutor<'_>, new: &NewPlan<'_>) -> Result<Plan> {
    sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (name, description, duration_weeks, created_by, is_public) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.description)
    .bind(new.duration_weeks)
    .bind(new.created_by)
    .bind(new.is_public)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert plan {:?}", new.name))
}

pub async fn get_plan(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Plan>> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch plan")
}

/// Fetch a plan and hold a share lock on it for the rest of the
/// transaction, so it cannot be deleted while schedules are generated.
pub async fn get_plan_for_share(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Plan>> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 FOR SHARE")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch plan for share")
}

/// Plans visible to `viewer`: public ones plus their own. Newest first.
pub async fn list_plans(db: impl PgExecutor<'_>, viewer: Option<Uuid>) -> Result<Vec<Plan>> {
    sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE is_public OR created_by = $1 ORDER BY created_at DESC",
    )
    .bind(viewer)
    .fetch_all(db)
    .await
    .context("failed to list plans")
}

pub async fn touch_plan(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("UPDATE plans SET updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to touch plan")?;

    if result.rows_affected() == 0 {
        bail!("plan {id} not found");
    }
    Ok(())
}

/// Delete a plan. Its slots and subscriptions cascade; scheduled workouts
/// from those subscriptions go with them.
pub async fn delete_plan(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete plan")?;

    if result.rows_affected() == 0 {
        bail!("plan {id} not found");
    }
    Ok(())
}

/// Fetch a plan and lock it against concurrent edits and new
/// subscriptions until the transaction ends.
pub async fn lock_plan(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Plan>> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to lock plan")
}
