//! Database query functions for the `nutrition_goals` table.
//!
//! A partial unique index allows at most one active goal per user, so
//! callers deactivate the current goal before activating another.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::NutritionGoal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalTargets {
    pub daily_calories: Option<f64>,
    pub daily_protein_g: Option<f64>,
    pub daily_carbs_g: Option<f64>,
    pub daily_fat_g: Option<f64>,
}

pub async fn insert_goal(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    targets: &GoalTargets,
    is_active: bool,
) -> Result<NutritionGoal> {
    sqlx::query_as::<_, NutritionGoal>(
        "INSERT INTO nutrition_goals \
         (user_id, daily_calories, daily_protein_g, daily_carbs_g, daily_fat_g, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(targets.daily_calories)
    .bind(targets.daily_protein_g)
    .bind(targets.daily_carbs_g)
    .bind(targets.daily_fat_g)
    .bind(is_active)
    .fetch_one(db)
    .await
    .context("failed to insert nutrition goal")
}

pub async fn active_goal(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Option<NutritionGoal>> {
    sqlx::query_as::<_, NutritionGoal>(
        "SELECT * FROM nutrition_goals WHERE user_id = $1 AND is_active",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("failed to fetch active nutrition goal")
}

pub async fn list_goals(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<Vec<NutritionGoal>> {
    sqlx::query_as::<_, NutritionGoal>(
        "SELECT * FROM nutrition_goals WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("failed to list nutrition goals")
}

/// Returns the number of goals switched off.
pub async fn deactivate_all(db: impl PgExecutor<'_>, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE nutrition_goals SET is_active = false, updated_at = now() \
         WHERE user_id = $1 AND is_active",
    )
    .bind(user_id)
    .execute(db)
    .await
    .context("failed to deactivate nutrition goals")?;
    Ok(result.rows_affected())
}

pub async fn set_active(
    db: impl PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<NutritionGoal>> {
    sqlx::query_as::<_, NutritionGoal>(
        "UPDATE nutrition_goals SET is_active = true, updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("failed to activate nutrition goal")
}
