//! Database query functions for the `user_recent_foods` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::UserRecentFood;

/// Record one use of a food: insert on first use, otherwise bump the
/// counter and timestamp.
pub async fn track(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    fdc_id: i64,
    food_name: &str,
) -> Result<UserRecentFood> {
    sqlx::query_as::<_, UserRecentFood>(
        "INSERT INTO user_recent_foods (user_id, fdc_id, food_name) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, fdc_id) DO UPDATE \
         SET times_used = user_recent_foods.times_used + 1, \
             food_name = EXCLUDED.food_name, \
             last_used_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(fdc_id)
    .bind(food_name)
    .fetch_one(db)
    .await
    .context("failed to track recent food")
}

pub async fn recent(db: impl PgExecutor<'_>, user_id: Uuid, limit: i64) -> Result<Vec<UserRecentFood>> {
    sqlx::query_as::<_, UserRecentFood>(
        "SELECT * FROM user_recent_foods WHERE user_id = $1 \
         ORDER BY last_used_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("failed to list recent foods")
}

pub async fn frequent(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<UserRecentFood>> {
    sqlx::query_as::<_, UserRecentFood>(
        "SELECT * FROM user_recent_foods WHERE user_id = $1 \
         ORDER BY times_used DESC, last_used_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("failed to list frequent foods")
}
