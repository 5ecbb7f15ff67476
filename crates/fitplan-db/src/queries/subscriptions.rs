//! Database query functions for the `subscriptions` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Subscription, SubscriptionStatus};

/// Insert an `active` subscription.
pub async fn insert_subscription(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    plan_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Subscription> {
    sqlx::query_as::<_, Subscription>(
        "INSERT INTO subscriptions (user_id, plan_id, start_date, end_date, status) \
         VALUES ($1, $2, $3, $4, 'active') \
         RETURNING *",
    )
    .bind(user_id)
    .bind(plan_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(db)
    .await
    .context("failed to insert subscription")
}

pub async fn get_subscription(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch subscription")
}

/// Fetch a subscription and lock its row until the transaction ends.
///
/// Every mutating lifecycle operation starts here so two operations on the
/// same subscription serialize instead of interleaving their deletes and
/// inserts.
pub async fn lock_subscription(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to lock subscription")
}

/// The user's active subscription to `plan_id`, if any.
pub async fn find_active_for_plan(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    plan_id: Uuid,
) -> Result<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM subscriptions \
         WHERE user_id = $1 AND plan_id = $2 AND status = 'active' \
         LIMIT 1",
    )
    .bind(user_id)
    .bind(plan_id)
    .fetch_optional(db)
    .await
    .context("failed to look up active subscription")
}

pub async fn list_for_user(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    status: Option<SubscriptionStatus>,
) -> Result<Vec<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM subscriptions \
         WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) \
         ORDER BY start_date DESC, created_at DESC",
    )
    .bind(user_id)
    .bind(status)
    .fetch_all(db)
    .await
    .context("failed to list subscriptions")
}

pub async fn update_dates(
    db: impl PgExecutor<'_>,
    id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Subscription> {
    sqlx::query_as::<_, Subscription>(
        "UPDATE subscriptions \
         SET start_date = $2, end_date = $3, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(start_date)
    .bind(end_date)
    .fetch_optional(db)
    .await
    .context("failed to update subscription dates")?
    .with_context(|| format!("subscription {id} not found"))
}

pub async fn update_status(
    db: impl PgExecutor<'_>,
    id: Uuid,
    status: SubscriptionStatus,
) -> Result<Subscription> {
    sqlx::query_as::<_, Subscription>(
        "UPDATE subscriptions SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(db)
    .await
    .context("failed to update subscription status")?
    .with_context(|| format!("subscription {id} not found"))
}

/// Returns `false` when no row matched.
pub async fn delete_subscription(db: impl PgExecutor<'_>, id: Uuid, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("failed to delete subscription")?;
    Ok(result.rows_affected() > 0)
}
