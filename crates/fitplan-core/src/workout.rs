//! Workout catalog: parameter validation, bulk import from TOML and
//! owner-checked edits.
//!
//! ```toml
//! [[workouts]]
//! name = "Back Squat"
//! category = "legs"
//! equipment = "barbell"
//!
//! [workouts.data]
//! type = "strength"
//! sets = 5
//! reps = 5
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use fitplan_db::models::{Workout, WorkoutData};
use fitplan_db::queries::workouts::{self, NewWorkout};

use crate::error::{ServiceError, ServiceResult};

const HEART_RATE_RANGE: std::ops::RangeInclusive<i32> = 30..=250;

#[derive(Debug, Error, PartialEq)]
pub enum WorkoutDataError {
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("target_heart_rate {0} is outside 30..=250")]
    HeartRate(i32),

    #[error("custom metric names must not be blank")]
    BlankMetricName,
}

fn check_f64(field: &str, value: Option<f64>) -> Result<(), WorkoutDataError> {
    match value {
        Some(v) if !v.is_finite() => Err(WorkoutDataError::NotFinite {
            field: field.to_owned(),
        }),
        Some(v) if v < 0.0 => Err(WorkoutDataError::Negative {
            field: field.to_owned(),
        }),
        _ => Ok(()),
    }
}

fn check_i32(field: &str, value: Option<i32>) -> Result<(), WorkoutDataError> {
    match value {
        Some(v) if v < 0 => Err(WorkoutDataError::Negative {
            field: field.to_owned(),
        }),
        _ => Ok(()),
    }
}

/// Check a parameter set before it is stored or used as a slot override.
pub fn validate_workout_data(data: &WorkoutData) -> Result<(), WorkoutDataError> {
    match data {
        WorkoutData::Strength(s) => {
            check_i32("sets", s.sets)?;
            check_i32("reps", s.reps)?;
            check_f64("weight_kg", s.weight_kg)?;
            check_i32("rest_seconds", s.rest_seconds)?;
        }
        WorkoutData::Cardio(c) => {
            check_f64("duration_minutes", c.duration_minutes)?;
            check_f64("distance_km", c.distance_km)?;
            if let Some(hr) = c.target_heart_rate {
                if !HEART_RATE_RANGE.contains(&hr) {
                    return Err(WorkoutDataError::HeartRate(hr));
                }
            }
        }
        WorkoutData::Flexibility(f) => {
            check_i32("duration_seconds", f.duration_seconds)?;
            check_i32("hold_count", f.hold_count)?;
        }
        WorkoutData::Custom(c) => {
            for (name, value) in &c.metrics {
                if name.trim().is_empty() {
                    return Err(WorkoutDataError::BlankMetricName);
                }
                check_f64(&format!("metrics.{name}"), Some(*value))?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogToml {
    #[serde(default)]
    pub workouts: Vec<WorkoutToml>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutToml {
    pub name: String,
    pub category: String,
    pub equipment: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    pub data: WorkoutData,
}

fn default_true() -> bool {
    true
}

/// Parse and validate a catalog file's contents.
pub fn parse_catalog_toml(input: &str) -> ServiceResult<CatalogToml> {
    let catalog: CatalogToml =
        toml::from_str(input).map_err(|e| ServiceError::invalid(format!("catalog TOML: {e}")))?;
    if catalog.workouts.is_empty() {
        return Err(ServiceError::invalid("catalog defines no workouts"));
    }
    for w in &catalog.workouts {
        check_workout(w)?;
    }
    Ok(catalog)
}

pub fn load_catalog_file(path: &Path) -> ServiceResult<CatalogToml> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_catalog_toml(&content)
}

/// Insert every workout of the catalog in one transaction.
pub async fn import_catalog(
    pool: &PgPool,
    catalog: &CatalogToml,
    created_by: Option<Uuid>,
) -> ServiceResult<Vec<Workout>> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(catalog.workouts.len());
    for w in &catalog.workouts {
        let row = workouts::insert_workout(&mut *tx, &as_new(w, created_by)).await?;
        inserted.push(row);
    }
    tx.commit().await?;
    tracing::info!(count = inserted.len(), "workouts imported");
    Ok(inserted)
}

fn check_workout(workout: &WorkoutToml) -> ServiceResult<()> {
    if workout.name.trim().is_empty() || workout.category.trim().is_empty() {
        return Err(ServiceError::invalid("workout name and category must not be blank"));
    }
    validate_workout_data(&workout.data)
        .map_err(|e| ServiceError::invalid(format!("workout {:?}: {e}", workout.name)))
}

fn as_new(workout: &WorkoutToml, created_by: Option<Uuid>) -> NewWorkout<'_> {
    NewWorkout {
        name: &workout.name,
        category: &workout.category,
        equipment: workout.equipment.as_deref(),
        description: workout.description.as_deref(),
        instructions: workout.instructions.as_deref(),
        workout_data: &workout.data,
        created_by,
        is_public: workout.is_public,
    }
}

/// Validate and insert a single workout.
pub async fn create_workout(
    pool: &PgPool,
    workout: &WorkoutToml,
    created_by: Option<Uuid>,
) -> ServiceResult<Workout> {
    check_workout(workout)?;
    Ok(workouts::insert_workout(pool, &as_new(workout, created_by)).await?)
}

/// Load a workout the actor may change. `None` is an operator acting from
/// the command line; a user may only change workouts they created.
async fn owned_workout(
    conn: &mut PgConnection,
    id: Uuid,
    actor: Option<Uuid>,
) -> ServiceResult<Workout> {
    let workout = workouts::lock_workout(&mut *conn, id)
        .await?
        .filter(|w| actor.is_none_or(|a| w.visible_to(a)))
        .ok_or_else(|| ServiceError::not_found(format!("workout {id}")))?;
    if actor.is_some() && workout.created_by != actor {
        return Err(ServiceError::forbidden(format!("workout {id}")));
    }
    Ok(workout)
}

/// Replace the editable fields of a workout. Records already scheduled
/// keep their snapshot.
pub async fn update_workout(
    pool: &PgPool,
    id: Uuid,
    actor: Option<Uuid>,
    workout: &WorkoutToml,
) -> ServiceResult<Workout> {
    check_workout(workout)?;
    let mut tx = pool.begin().await?;
    let current = owned_workout(&mut tx, id, actor).await?;
    let updated = workouts::update_workout(&mut *tx, id, &as_new(workout, current.created_by))
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("workout {id}")))?;
    tx.commit().await?;

    tracing::info!(workout_id = %id, name = %updated.name, "workout updated");
    Ok(updated)
}

/// Delete a workout. Plan slots that reference it are skipped by later
/// generations.
pub async fn delete_workout(pool: &PgPool, id: Uuid, actor: Option<Uuid>) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;
    let current = owned_workout(&mut tx, id, actor).await?;
    workouts::delete_workout(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(workout_id = %id, name = %current.name, "workout deleted");
    Ok(())
}
