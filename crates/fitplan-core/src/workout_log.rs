//! The user's workout log: generated records plus ad-hoc entries.
//!
//! Generated records are written by the schedule lifecycle; this module
//! only adds ad-hoc entries and edits or removes existing ones.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use fitplan_db::models::{CompletedWorkoutData, CompletionState, ScheduledWorkout};
use fitplan_db::queries::scheduled_workouts::{
    self as records, NewScheduledWorkout, ScheduledFilter, WorkoutStats,
};
use fitplan_db::queries::workouts;

use crate::error::{ServiceError, ServiceResult};

pub const MAX_PAGE_SIZE: i64 = 500;

/// Values the user actually achieved. `None` leaves the stored value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformedValues {
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub distance_km: Option<f64>,
    pub duration_seconds: Option<i32>,
}

impl PerformedValues {
    fn validate(&self) -> ServiceResult<()> {
        let ints = [
            ("sets", self.sets),
            ("reps", self.reps),
            ("duration_seconds", self.duration_seconds),
        ];
        for (field, v) in ints {
            if v.is_some_and(|v| v < 0) {
                return Err(ServiceError::invalid(format!("{field} must not be negative")));
            }
        }
        for (field, v) in [("weight_kg", self.weight_kg), ("distance_km", self.distance_km)] {
            if v.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(ServiceError::invalid(format!(
                    "{field} must be a finite, non-negative number"
                )));
            }
        }
        Ok(())
    }

    fn apply(&self, data: &mut CompletedWorkoutData) {
        if self.sets.is_some() {
            data.performed_sets = self.sets;
        }
        if self.reps.is_some() {
            data.performed_reps = self.reps;
        }
        if self.weight_kg.is_some() {
            data.performed_weight_kg = self.weight_kg;
        }
        if self.distance_km.is_some() {
            data.performed_distance_km = self.distance_km;
        }
        if self.duration_seconds.is_some() {
            data.performed_duration_seconds = self.duration_seconds;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledUpdate {
    pub notes: Option<String>,
    pub completion_state: Option<CompletionState>,
    #[serde(default)]
    pub performed: PerformedValues,
}

/// Record a workout outside any subscription. The snapshot is taken from
/// the workout as it is now; another user's private workout is treated as
/// missing.
pub async fn log_workout(
    pool: &PgPool,
    user_id: Uuid,
    workout_id: Uuid,
    performed_at: NaiveDate,
    notes: Option<String>,
) -> ServiceResult<ScheduledWorkout> {
    let workout = workouts::get_workout(pool, workout_id)
        .await?
        .filter(|w| w.visible_to(user_id))
        .ok_or_else(|| ServiceError::not_found(format!("workout {workout_id}")))?;

    let row = NewScheduledWorkout {
        user_id,
        workout_id,
        completed_workout_data: CompletedWorkoutData::snapshot(
            &workout,
            workout.workout_data.0.clone(),
        ),
        performed_at,
        notes,
        plan_id: None,
        subscription_id: None,
        slot_id: None,
    };
    let record = records::insert_one(pool, &row).await?;

    info!(record_id = %record.id, %user_id, %workout_id, %performed_at, "workout logged");
    Ok(record)
}

pub async fn get_scheduled(pool: &PgPool, id: Uuid, user_id: Uuid) -> ServiceResult<ScheduledWorkout> {
    records::get_scheduled(pool, id, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("scheduled workout {id}")))
}

/// List records newest first. The page size is clamped to
/// `1..=MAX_PAGE_SIZE`.
pub async fn list_scheduled(
    pool: &PgPool,
    filter: &ScheduledFilter,
) -> ServiceResult<Vec<ScheduledWorkout>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ServiceError::invalid(format!("from {from} is after to {to}")));
        }
    }
    let mut filter = filter.clone();
    filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
    filter.offset = filter.offset.max(0);
    Ok(records::list_scheduled(pool, &filter).await?)
}

/// Apply `update` to an owned record. Notes and completion state replace
/// the stored values when given; performed values are merged into the
/// snapshot field by field.
pub async fn update_scheduled(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    update: &ScheduledUpdate,
) -> ServiceResult<ScheduledWorkout> {
    update.performed.validate()?;

    let mut tx = pool.begin().await?;
    let current = records::get_scheduled(&mut *tx, id, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("scheduled workout {id}")))?;

    let mut data = current.completed_workout_data.0.clone();
    update.performed.apply(&mut data);
    let notes = update.notes.as_deref().or(current.notes.as_deref());
    let state = update.completion_state.unwrap_or(current.completion_state);

    let updated = records::update_scheduled(&mut *tx, id, user_id, notes, state, &data)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("scheduled workout {id}")))?;
    tx.commit().await?;

    info!(record_id = %id, %user_id, state = %state, "scheduled workout updated");
    Ok(updated)
}

pub async fn delete_scheduled(pool: &PgPool, id: Uuid, user_id: Uuid) -> ServiceResult<()> {
    if !records::delete_scheduled(pool, id, user_id).await? {
        return Err(ServiceError::not_found(format!("scheduled workout {id}")));
    }
    info!(record_id = %id, %user_id, "scheduled workout deleted");
    Ok(())
}

pub async fn workout_stats(pool: &PgPool, user_id: Uuid, since: NaiveDate) -> ServiceResult<WorkoutStats> {
    Ok(records::stats(pool, user_id, since).await?)
}
