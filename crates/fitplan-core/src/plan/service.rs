//! Plan service layer.
//!
//! Writes a parsed plan file to the database, replaces a plan's slot set
//! and deletes plans. Each write runs in a single transaction.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use fitplan_db::models::{Plan, PlanSlot};
use fitplan_db::queries::plan_slots::{self, NewPlanSlot};
use fitplan_db::queries::plans::{self as plan_queries, NewPlan};
use fitplan_db::queries::workouts;

use super::parser::check_slot;
use super::toml_format::PlanToml;
use crate::error::{ServiceError, ServiceResult};

/// Create a plan and its slots from a validated [`PlanToml`].
///
/// Workout names are resolved against the part of the catalog the creator
/// can see; if any is unknown the whole operation fails and nothing is
/// written.
pub async fn create_plan_from_toml(
    pool: &PgPool,
    plan_toml: &PlanToml,
    created_by: Option<Uuid>,
) -> ServiceResult<(Plan, Vec<PlanSlot>)> {
    let mut tx = pool.begin().await?;

    // 1. Insert the plan row.
    let plan = plan_queries::insert_plan(
        &mut *tx,
        &NewPlan {
            name: &plan_toml.plan.name,
            description: plan_toml.plan.description.as_deref(),
            duration_weeks: plan_toml.plan.duration_weeks,
            created_by,
            is_public: plan_toml.plan.is_public,
        },
    )
    .await?;

    // 2. Resolve workout names.
    let mut names: Vec<String> = plan_toml.slots.iter().map(|s| s.workout.clone()).collect();
    names.sort();
    names.dedup();
    let by_name: HashMap<String, Uuid> = workouts::get_workouts_by_names(&mut *tx, &names, created_by)
        .await?
        .into_iter()
        .map(|w| (w.name, w.id))
        .collect();

    let missing: Vec<&str> = names
        .iter()
        .filter(|n| !by_name.contains_key(*n))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        // Transaction rolls back on drop (no commit).
        return Err(ServiceError::invalid(format!(
            "plan references unknown workouts: {}",
            missing.join(", ")
        )));
    }

    // 3. Insert all slots in one statement.
    let new_slots: Vec<NewPlanSlot> = plan_toml
        .slots
        .iter()
        .map(|s| NewPlanSlot {
            workout_id: by_name[&s.workout],
            week_offset: s.week_offset,
            week_day: s.week_day,
            slot_order: s.order,
            data_override: s.data_override.clone(),
        })
        .collect();
    let slots = plan_slots::insert_slots(&mut *tx, plan.id, &new_slots).await?;

    tx.commit().await?;

    info!(plan_id = %plan.id, name = %plan.name, slots = slots.len(), "plan created");
    Ok((plan, slots))
}

/// Replace every slot of `plan_id` with `slots`.
///
/// `actor` is the user making the change; `None` means an operator acting
/// from the command line, who may edit any plan. Existing subscriptions
/// keep their records until they are regenerated.
pub async fn replace_plan_slots(
    pool: &PgPool,
    plan_id: Uuid,
    actor: Option<Uuid>,
    slots: &[NewPlanSlot],
) -> ServiceResult<Vec<PlanSlot>> {
    if slots.is_empty() {
        return Err(ServiceError::invalid("plan must contain at least one slot"));
    }

    let mut tx = pool.begin().await?;

    let plan = plan_queries::lock_plan(&mut *tx, plan_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("plan {plan_id}")))?;
    if actor.is_some() && plan.created_by != actor {
        return Err(ServiceError::forbidden(format!("plan {plan_id}")));
    }

    for (i, slot) in slots.iter().enumerate() {
        check_slot(
            i + 1,
            slot.week_offset,
            slot.week_day,
            slot.data_override.as_ref(),
            plan.duration_weeks,
        )
        .map_err(|e| ServiceError::invalid(e.to_string()))?;
    }

    let wanted: HashSet<Uuid> = slots.iter().map(|s| s.workout_id).collect();
    let ids: Vec<Uuid> = wanted.iter().copied().collect();
    // Another user's private workout counts as unknown.
    let found: HashSet<Uuid> = workouts::get_workouts_by_ids(&mut *tx, &ids)
        .await?
        .into_iter()
        .filter(|w| actor.is_none_or(|a| w.visible_to(a)))
        .map(|w| w.id)
        .collect();
    let mut missing: Vec<String> = wanted.difference(&found).map(Uuid::to_string).collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ServiceError::invalid(format!(
            "unknown workouts: {}",
            missing.join(", ")
        )));
    }

    let removed = plan_slots::delete_slots_for_plan(&mut *tx, plan_id).await?;
    let inserted = plan_slots::insert_slots(&mut *tx, plan_id, slots).await?;
    plan_queries::touch_plan(&mut *tx, plan_id).await?;

    tx.commit().await?;

    info!(%plan_id, removed, inserted = inserted.len(), "plan slots replaced");
    Ok(inserted)
}

/// Delete a plan together with its slots and every subscription to it.
///
/// Only the creator may delete a plan; `None` is an operator acting from
/// the command line. A plan the actor cannot see is reported as missing.
pub async fn delete_plan(pool: &PgPool, plan_id: Uuid, actor: Option<Uuid>) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let plan = plan_queries::lock_plan(&mut *tx, plan_id)
        .await?
        .filter(|p| actor.is_none_or(|a| p.visible_to(a)))
        .ok_or_else(|| ServiceError::not_found(format!("plan {plan_id}")))?;
    if actor.is_some() && plan.created_by != actor {
        return Err(ServiceError::forbidden(format!("plan {plan_id}")));
    }

    plan_queries::delete_plan(&mut *tx, plan_id).await?;
    tx.commit().await?;

    info!(%plan_id, name = %plan.name, "plan deleted");
    Ok(())
}

/// Fetch a plan and its slots in generation order.
pub async fn get_plan_with_slots(
    pool: &PgPool,
    plan_id: Uuid,
) -> ServiceResult<(Plan, Vec<PlanSlot>)> {
    let plan = plan_queries::get_plan(pool, plan_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("plan {plan_id}")))?;
    let slots = plan_slots::list_slots_for_plan(pool, plan_id).await?;
    Ok((plan, slots))
}
