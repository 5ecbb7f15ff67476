//! Subscription lifecycle: subscribe, unsubscribe, regenerate, reschedule
//! and explicit status changes.
//!
//! Each operation runs in one transaction; if anything fails the
//! transaction is dropped without commit and nothing it wrote survives.
//! Operations on an existing subscription first take `FOR UPDATE` on its
//! row, so two operations on the same subscription run one after the
//! other. `subscribe` takes `FOR SHARE` on the plan so the template cannot
//! vanish mid-generation.
//!
//! ```text
//! subscribe    -> active   (at most one active per user and plan)
//! any status   -> any status   (explicit update_status only)
//! unsubscribe  -> row and its generated records deleted
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use fitplan_db::models::{Subscription, SubscriptionStatus, Workout};
use fitplan_db::queries::{
    plan_slots, plans, scheduled_workouts, subscriptions as subs, workouts,
};

use super::generator::{end_date, generate};
use crate::error::{LifecycleError, ServiceResult};

/// Record counts from one delete-then-generate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub removed: u64,
    pub inserted: u64,
}

/// Subscribe `user_id` to `plan_id` starting on `start_date` and generate
/// the full schedule.
///
/// The plan must be visible to the user, and the user must not already
/// hold an active subscription to it.
pub async fn subscribe(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    start_date: NaiveDate,
) -> ServiceResult<Subscription> {
    let mut tx = pool.begin().await?;

    // A private plan of another user is reported as missing, as on read.
    let plan = plans::get_plan_for_share(&mut *tx, plan_id)
        .await?
        .filter(|p| p.visible_to(user_id))
        .ok_or_else(|| LifecycleError::not_found(format!("plan {plan_id}")))?;
    if subs::find_active_for_plan(&mut *tx, user_id, plan_id).await?.is_some() {
        return Err(LifecycleError::invalid(format!(
            "already subscribed to plan {plan_id}"
        )));
    }
    let end = end_date(start_date, plan.duration_weeks)
        .ok_or_else(|| anyhow::anyhow!("end date of plan {plan_id} is out of range"))?;

    let subscription = subs::insert_subscription(&mut *tx, user_id, plan_id, start_date, end).await?;
    let inserted = generate_into(&mut tx, &subscription).await?;

    tx.commit().await?;

    info!(
        subscription_id = %subscription.id,
        %user_id,
        %plan_id,
        %start_date,
        inserted,
        "subscribed"
    );
    Ok(subscription)
}

/// Delete a subscription and every record generated for it.
pub async fn unsubscribe(pool: &PgPool, subscription_id: Uuid, user_id: Uuid) -> ServiceResult<bool> {
    let mut tx = pool.begin().await?;

    lock_owned(&mut tx, subscription_id, user_id).await?;
    let removed =
        scheduled_workouts::delete_by_subscription_and_user(&mut *tx, subscription_id, user_id)
            .await?;
    let deleted = subs::delete_subscription(&mut *tx, subscription_id, user_id).await?;

    tx.commit().await?;

    info!(%subscription_id, %user_id, removed, "unsubscribed");
    Ok(deleted)
}

/// Replace a subscription's generated records with a fresh expansion of
/// the plan's current template, keeping the current start date.
pub async fn regenerate(
    pool: &PgPool,
    subscription_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<GenerationSummary> {
    let mut tx = pool.begin().await?;

    let subscription = lock_owned(&mut tx, subscription_id, user_id).await?;
    let removed =
        scheduled_workouts::delete_by_subscription_and_user(&mut *tx, subscription_id, user_id)
            .await?;
    let inserted = generate_into(&mut tx, &subscription).await?;

    tx.commit().await?;

    info!(%subscription_id, %user_id, removed, inserted, "regenerated");
    Ok(GenerationSummary { removed, inserted })
}

/// Move a subscription to `new_start_date`: recompute its end date and
/// regenerate every record relative to the new start.
pub async fn reschedule(
    pool: &PgPool,
    subscription_id: Uuid,
    user_id: Uuid,
    new_start_date: NaiveDate,
) -> ServiceResult<Subscription> {
    let mut tx = pool.begin().await?;

    let current = lock_owned(&mut tx, subscription_id, user_id).await?;
    let plan = plans::get_plan_for_share(&mut *tx, current.plan_id)
        .await?
        .ok_or_else(|| LifecycleError::not_found(format!("plan {}", current.plan_id)))?;
    let end = end_date(new_start_date, plan.duration_weeks)
        .ok_or_else(|| anyhow::anyhow!("end date of plan {} is out of range", plan.id))?;

    let updated = subs::update_dates(&mut *tx, subscription_id, new_start_date, end).await?;
    let removed =
        scheduled_workouts::delete_by_subscription_and_user(&mut *tx, subscription_id, user_id)
            .await?;
    let inserted = generate_into(&mut tx, &updated).await?;

    tx.commit().await?;

    info!(
        %subscription_id,
        %user_id,
        from = %current.start_date,
        to = %new_start_date,
        removed,
        inserted,
        "rescheduled"
    );
    Ok(updated)
}

/// Set the status of an owned subscription. Generated records are left
/// as they are.
pub async fn update_status(
    pool: &PgPool,
    subscription_id: Uuid,
    user_id: Uuid,
    status: SubscriptionStatus,
) -> ServiceResult<Subscription> {
    let mut tx = pool.begin().await?;

    let current = lock_owned(&mut tx, subscription_id, user_id).await?;
    let updated = subs::update_status(&mut *tx, subscription_id, status).await?;

    tx.commit().await?;

    info!(%subscription_id, from = %current.status, to = %status, "subscription status changed");
    Ok(updated)
}

pub async fn get_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<Subscription> {
    let found = subs::get_subscription(pool, subscription_id).await?;
    check_owner(found, subscription_id, user_id)
}

pub async fn list_subscriptions(
    pool: &PgPool,
    user_id: Uuid,
    status: Option<SubscriptionStatus>,
) -> ServiceResult<Vec<Subscription>> {
    Ok(subs::list_for_user(pool, user_id, status).await?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn lock_owned(
    conn: &mut PgConnection,
    subscription_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<Subscription> {
    let found = subs::lock_subscription(&mut *conn, subscription_id).await?;
    check_owner(found, subscription_id, user_id)
}

fn check_owner(
    found: Option<Subscription>,
    subscription_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<Subscription> {
    match found {
        None => Err(LifecycleError::not_found(format!("subscription {subscription_id}"))),
        Some(s) if s.user_id != user_id => Err(LifecycleError::forbidden(format!(
            "subscription {subscription_id}"
        ))),
        Some(s) => Ok(s),
    }
}

/// Load the template for `subscription`, expand it and bulk insert the
/// result. Returns the number of rows written.
async fn generate_into(conn: &mut PgConnection, subscription: &Subscription) -> ServiceResult<u64> {
    let slots = plan_slots::list_slots_for_plan(&mut *conn, subscription.plan_id).await?;
    if slots.is_empty() {
        return Ok(0);
    }

    let mut ids: Vec<Uuid> = slots.iter().map(|s| s.workout_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let catalog: HashMap<Uuid, Workout> = workouts::get_workouts_by_ids(&mut *conn, &ids)
        .await?
        .into_iter()
        .map(|w| (w.id, w))
        .collect();

    let drafts = generate(subscription, &slots, &catalog);
    if drafts.is_empty() {
        return Ok(0);
    }
    Ok(scheduled_workouts::bulk_insert(conn, &drafts).await?)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sub(user_id: Uuid) -> Subscription {
        let now = Utc::now();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Subscription {
            id: Uuid::new_v4(),
            user_id,
            plan_id: Uuid::new_v4(),
            start_date: start,
            end_date: start,
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn missing_subscription_is_not_found() {
        let id = Uuid::new_v4();
        let err = check_owner(None, id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn other_owner_is_forbidden() {
        let s = sub(Uuid::new_v4());
        let err = check_owner(Some(s.clone()), s.id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
    }

    #[test]
    fn owner_passes() {
        let owner = Uuid::new_v4();
        let s = sub(owner);
        let got = check_owner(Some(s.clone()), s.id, owner).unwrap();
        assert_eq!(got.id, s.id);
    }
}
