//! Database query functions for the `scheduled_workouts` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{CompletedWorkoutData, CompletionState, ScheduledWorkout};

/// Bind parameters per row in [`bulk_insert`].
const COLUMNS_PER_ROW: usize = 8;
/// Rows per INSERT statement; keeps each statement under the 65535 bind
/// parameter limit of the Postgres wire protocol.
const ROWS_PER_STATEMENT: usize = 65535 / COLUMNS_PER_ROW;

/// A scheduled workout not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewScheduledWorkout {
    pub user_id: Uuid,
    pub workout_id: Uuid,
    pub completed_workout_data: CompletedWorkoutData,
    pub performed_at: NaiveDate,
    pub notes: Option<String>,
    pub plan_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
}

/// Insert many records, skipping any whose
/// `(user_id, subscription_id, slot_id, performed_at)` already exists.
///
/// Returns the number of rows actually inserted.
pub async fn bulk_insert(conn: &mut PgConnection, rows: &[NewScheduledWorkout]) -> Result<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(ROWS_PER_STATEMENT) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO scheduled_workouts \
             (user_id, workout_id, completed_workout_data, performed_at, notes, plan_id, subscription_id, slot_id) ",
        );
        qb.push_values(chunk, |mut b, row| {
            b.push_bind(row.user_id)
                .push_bind(row.workout_id)
                .push_bind(Json(&row.completed_workout_data))
                .push_bind(row.performed_at)
                .push_bind(row.notes.as_deref())
                .push_bind(row.plan_id)
                .push_bind(row.subscription_id)
                .push_bind(row.slot_id);
        });
        qb.push(" ON CONFLICT ON CONSTRAINT uq_scheduled_slot_occurrence DO NOTHING");

        let result = qb
            .build()
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to bulk insert {} scheduled workouts", chunk.len()))?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

pub async fn insert_one(
    db: impl PgExecutor<'_>,
    row: &NewScheduledWorkout,
) -> Result<ScheduledWorkout> {
    sqlx::query_as::<_, ScheduledWorkout>(
        "INSERT INTO scheduled_workouts \
         (user_id, workout_id, completed_workout_data, performed_at, notes, plan_id, subscription_id, slot_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(row.user_id)
    .bind(row.workout_id)
    .bind(Json(&row.completed_workout_data))
    .bind(row.performed_at)
    .bind(row.notes.as_deref())
    .bind(row.plan_id)
    .bind(row.subscription_id)
    .bind(row.slot_id)
    .fetch_one(db)
    .await
    .context("failed to insert scheduled workout")
}

/// Remove every record generated for `subscription_id` and owned by
/// `user_id`. Returns the number removed.
pub async fn delete_by_subscription_and_user(
    db: impl PgExecutor<'_>,
    subscription_id: Uuid,
    user_id: Uuid,
) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM scheduled_workouts WHERE subscription_id = $1 AND user_id = $2")
            .bind(subscription_id)
            .bind(user_id)
            .execute(db)
            .await
            .context("failed to delete scheduled workouts for subscription")?;
    Ok(result.rows_affected())
}

pub async fn count_for_subscription(db: impl PgExecutor<'_>, subscription_id: Uuid) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM scheduled_workouts WHERE subscription_id = $1")
        .bind(subscription_id)
        .fetch_one(db)
        .await
        .context("failed to count scheduled workouts")
}

pub async fn get_scheduled(
    db: impl PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<ScheduledWorkout>> {
    sqlx::query_as::<_, ScheduledWorkout>(
        "SELECT * FROM scheduled_workouts WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("failed to fetch scheduled workout")
}

/// Filters for [`list_scheduled`]. Unset fields do not constrain.
#[derive(Debug, Clone)]
pub struct ScheduledFilter {
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub workout_id: Option<Uuid>,
    pub completion_state: Option<CompletionState>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl ScheduledFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            subscription_id: None,
            plan_id: None,
            workout_id: None,
            completion_state: None,
            from: None,
            to: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Newest first; `from` and `to` are inclusive.
pub async fn list_scheduled(
    db: impl PgExecutor<'_>,
    filter: &ScheduledFilter,
) -> Result<Vec<ScheduledWorkout>> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM scheduled_workouts WHERE user_id = ");
    qb.push_bind(filter.user_id);
    if let Some(id) = filter.subscription_id {
        qb.push(" AND subscription_id = ").push_bind(id);
    }
    if let Some(id) = filter.plan_id {
        qb.push(" AND plan_id = ").push_bind(id);
    }
    if let Some(id) = filter.workout_id {
        qb.push(" AND workout_id = ").push_bind(id);
    }
    if let Some(state) = filter.completion_state {
        qb.push(" AND completion_state = ").push_bind(state);
    }
    if let Some(from) = filter.from {
        qb.push(" AND performed_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND performed_at <= ").push_bind(to);
    }
    qb.push(" ORDER BY performed_at DESC, created_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    qb.build_query_as::<ScheduledWorkout>()
        .fetch_all(db)
        .await
        .context("failed to list scheduled workouts")
}

/// Overwrite the mutable columns of an owned record.
pub async fn update_scheduled(
    db: impl PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
    notes: Option<&str>,
    completion_state: CompletionState,
    data: &CompletedWorkoutData,
) -> Result<Option<ScheduledWorkout>> {
    sqlx::query_as::<_, ScheduledWorkout>(
        "UPDATE scheduled_workouts \
         SET notes = $3, completion_state = $4, completed_workout_data = $5, updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(notes)
    .bind(completion_state)
    .bind(Json(data))
    .fetch_optional(db)
    .await
    .context("failed to update scheduled workout")
}

/// Returns `false` when nothing matched.
pub async fn delete_scheduled(db: impl PgExecutor<'_>, id: Uuid, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM scheduled_workouts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("failed to delete scheduled workout")?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct WorkoutStats {
    pub total: i64,
    pub completed: i64,
    pub distinct_days: i64,
    pub distinct_workouts: i64,
}

/// Aggregate counts over a user's records performed on or after `since`.
pub async fn stats(db: impl PgExecutor<'_>, user_id: Uuid, since: NaiveDate) -> Result<WorkoutStats> {
    sqlx::query_as::<_, WorkoutStats>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE completion_state = 'complete') AS completed, \
                COUNT(DISTINCT performed_at) AS distinct_days, \
                COUNT(DISTINCT workout_id) AS distinct_workouts \
         FROM scheduled_workouts \
         WHERE user_id = $1 AND performed_at >= $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(db)
    .await
    .context("failed to compute workout stats")
}
