//! Database query functions for the `workouts` table (the workout catalog).

use anyhow::{Context, Result, bail};
use sqlx::PgExecutor;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{Workout, WorkoutData};

#[derive(Debug, Clone)]
pub struct NewWorkout<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub equipment: Option<&'a str>,
    pub description: Option<&'a str>,
    pub instructions: Option<&'a str>,
    pub workout_data: &'a WorkoutData,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
}

pub async fn insert_workout(db: impl PgExecutor<'_>, new: &NewWorkout<'_>) -> Result<Workout> {
    sqlx::query_as::<_, Workout>(
        "INSERT INTO workouts \
         (name, category, equipment, description, instructions, workout_data, created_by, is_public) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.category)
    .bind(new.equipment)
    .bind(new.description)
    .bind(new.instructions)
    .bind(Json(new.workout_data))
    .bind(new.created_by)
    .bind(new.is_public)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert workout {:?}", new.name))
}

pub async fn get_workout(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Workout>> {
    sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch workout")
}

/// Fetch a workout and lock its row until the transaction ends.
pub async fn lock_workout(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Workout>> {
    sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to lock workout")
}

/// Fetch every workout whose id is in `ids`. Unknown ids are simply absent
/// from the result.
pub async fn get_workouts_by_ids(db: impl PgExecutor<'_>, ids: &[Uuid]) -> Result<Vec<Workout>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Workout>("SELECT * FROM workouts WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await
        .context("failed to fetch workouts by id")
}

/// Resolve workout names to rows. When several workouts share a name the
/// oldest one wins. With a `viewer`, only workouts visible to them are
/// considered.
pub async fn get_workouts_by_names(
    db: impl PgExecutor<'_>,
    names: &[String],
    viewer: Option<Uuid>,
) -> Result<Vec<Workout>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Workout>(
        "SELECT DISTINCT ON (name) * FROM workouts \
         WHERE name = ANY($1) \
           AND ($2::uuid IS NULL OR is_public OR created_by = $2) \
         ORDER BY name, created_at ASC",
    )
    .bind(names)
    .bind(viewer)
    .fetch_all(db)
    .await
    .context("failed to fetch workouts by name")
}

/// List workouts visible to `viewer` (public ones plus their own),
/// optionally narrowed to one category.
pub async fn list_workouts(
    db: impl PgExecutor<'_>,
    viewer: Option<Uuid>,
    category: Option<&str>,
) -> Result<Vec<Workout>> {
    sqlx::query_as::<_, Workout>(
        "SELECT * FROM workouts \
         WHERE (is_public OR created_by = $1) \
           AND ($2::text IS NULL OR category = $2) \
         ORDER BY category, name",
    )
    .bind(viewer)
    .bind(category)
    .fetch_all(db)
    .await
    .context("failed to list workouts")
}

/// Overwrite every editable column. Returns `None` when the row is gone.
pub async fn update_workout(
    db: impl PgExecutor<'_>,
    id: Uuid,
    changes: &NewWorkout<'_>,
) -> Result<Option<Workout>> {
    sqlx::query_as::<_, Workout>(
        "UPDATE workouts \
         SET name = $2, category = $3, equipment = $4, description = $5, \
             instructions = $6, workout_data = $7, is_public = $8, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.category)
    .bind(changes.equipment)
    .bind(changes.description)
    .bind(changes.instructions)
    .bind(Json(changes.workout_data))
    .bind(changes.is_public)
    .fetch_optional(db)
    .await
    .with_context(|| format!("failed to update workout {id}"))
}

/// Delete a workout. Scheduled records keep their snapshot and plan slots
/// keep the now-dangling id.
pub async fn delete_workout(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete workout")?;

    if result.rows_affected() == 0 {
        bail!("workout {id} not found");
    }
    Ok(())
}
