//! Database query functions for the `plan_slots` table.
//!
//! Slots are never edited in place: a plan's whole slot set is replaced by
//! deleting and re-inserting inside one transaction.

use anyhow::{Context, Result};
use sqlx::types::Json;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{PlanSlot, WorkoutData};

#[derive(Debug, Clone)]
pub struct NewPlanSlot {
    pub workout_id: Uuid,
    pub week_offset: i32,
    pub week_day: i32,
    pub slot_order: i32,
    pub data_override: Option<WorkoutData>,
}

/// Insert `slots` for `plan_id` in a single statement.
pub async fn insert_slots(
    db: impl PgExecutor<'_>,
    plan_id: Uuid,
    slots: &[NewPlanSlot],
) -> Result<Vec<PlanSlot>> {
    if slots.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO plan_slots (plan_id, workout_id, week_offset, week_day, slot_order, data_override) ",
    );
    qb.push_values(slots, |mut row, slot| {
        row.push_bind(plan_id)
            .push_bind(slot.workout_id)
            .push_bind(slot.week_offset)
            .push_bind(slot.week_day)
            .push_bind(slot.slot_order)
            .push_bind(slot.data_override.clone().map(Json));
    });
    qb.push(" RETURNING *");

    qb.build_query_as::<PlanSlot>()
        .fetch_all(db)
        .await
        .with_context(|| format!("failed to insert {} slots for plan {plan_id}", slots.len()))
}

/// All slots of a plan in generation order: week offset, then weekday,
/// then explicit order.
pub async fn list_slots_for_plan(db: impl PgExecutor<'_>, plan_id: Uuid) -> Result<Vec<PlanSlot>> {
    sqlx::query_as::<_, PlanSlot>(
        "SELECT * FROM plan_slots WHERE plan_id = $1 \
         ORDER BY week_offset, week_day, slot_order, created_at, id",
    )
    .bind(plan_id)
    .fetch_all(db)
    .await
    .context("failed to list plan slots")
}

/// Returns the number of slots removed.
pub async fn delete_slots_for_plan(db: impl PgExecutor<'_>, plan_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM plan_slots WHERE plan_id = $1")
        .bind(plan_id)
        .execute(db)
        .await
        .context("failed to delete plan slots")?;
    Ok(result.rows_affected())
}
