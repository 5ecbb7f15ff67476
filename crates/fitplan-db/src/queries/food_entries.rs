//! Database query functions for the `food_entries` table (the diet diary).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{FoodEntry, MealType};

/// Values written on insert and on full update.
#[derive(Debug, Clone)]
pub struct FoodEntryValues<'a> {
    pub fdc_id: i64,
    pub food_name: &'a str,
    pub data_type: Option<&'a str>,
    pub serving_size: f64,
    pub serving_unit: &'a str,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub consumed_at: DateTime<Utc>,
    pub meal_type: Option<MealType>,
    pub notes: Option<&'a str>,
}

pub async fn insert_entry(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    v: &FoodEntryValues<'_>,
) -> Result<FoodEntry> {
    sqlx::query_as::<_, FoodEntry>(
        "INSERT INTO food_entries \
         (user_id, fdc_id, food_name, data_type, serving_size, serving_unit, \
          calories, protein_g, carbs_g, fat_g, fiber_g, consumed_at, meal_type, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(v.fdc_id)
    .bind(v.food_name)
    .bind(v.data_type)
    .bind(v.serving_size)
    .bind(v.serving_unit)
    .bind(v.calories)
    .bind(v.protein_g)
    .bind(v.carbs_g)
    .bind(v.fat_g)
    .bind(v.fiber_g)
    .bind(v.consumed_at)
    .bind(v.meal_type)
    .bind(v.notes)
    .fetch_one(db)
    .await
    .context("failed to insert food entry")
}

pub async fn get_entry(db: impl PgExecutor<'_>, id: Uuid, user_id: Uuid) -> Result<Option<FoodEntry>> {
    sqlx::query_as::<_, FoodEntry>("SELECT * FROM food_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("failed to fetch food entry")
}

/// Half-open `[from, to)` window plus optional meal filter.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    pub user_id: Uuid,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub meal_type: Option<MealType>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list_entries(db: impl PgExecutor<'_>, filter: &EntryFilter) -> Result<Vec<FoodEntry>> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM food_entries WHERE user_id = ");
    qb.push_bind(filter.user_id);
    if let Some(from) = filter.from {
        qb.push(" AND consumed_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND consumed_at < ").push_bind(to);
    }
    if let Some(meal) = filter.meal_type {
        qb.push(" AND meal_type = ").push_bind(meal);
    }
    qb.push(" ORDER BY consumed_at DESC LIMIT ")
        .push_bind(filter.limit)
        .push(" OFFSET ")
        .push_bind(filter.offset);

    qb.build_query_as::<FoodEntry>()
        .fetch_all(db)
        .await
        .context("failed to list food entries")
}

pub async fn update_entry(
    db: impl PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
    v: &FoodEntryValues<'_>,
) -> Result<Option<FoodEntry>> {
    sqlx::query_as::<_, FoodEntry>(
        "UPDATE food_entries SET \
           fdc_id = $3, food_name = $4, data_type = $5, serving_size = $6, serving_unit = $7, \
           calories = $8, protein_g = $9, carbs_g = $10, fat_g = $11, fiber_g = $12, \
           consumed_at = $13, meal_type = $14, notes = $15, updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(v.fdc_id)
    .bind(v.food_name)
    .bind(v.data_type)
    .bind(v.serving_size)
    .bind(v.serving_unit)
    .bind(v.calories)
    .bind(v.protein_g)
    .bind(v.carbs_g)
    .bind(v.fat_g)
    .bind(v.fiber_g)
    .bind(v.consumed_at)
    .bind(v.meal_type)
    .bind(v.notes)
    .fetch_optional(db)
    .await
    .context("failed to update food entry")
}

pub async fn delete_entry(db: impl PgExecutor<'_>, id: Uuid, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM food_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("failed to delete food entry")?;
    Ok(result.rows_affected() > 0)
}

/// Totals for one window of a user's diary. Missing nutrient values count
/// as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct NutrientTotals {
    pub entries: i64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

pub async fn totals_between(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<NutrientTotals> {
    sqlx::query_as::<_, NutrientTotals>(
        "SELECT COUNT(*) AS entries, \
                COALESCE(SUM(calories), 0) AS calories, \
                COALESCE(SUM(protein_g), 0) AS protein_g, \
                COALESCE(SUM(carbs_g), 0) AS carbs_g, \
                COALESCE(SUM(fat_g), 0) AS fat_g, \
                COALESCE(SUM(fiber_g), 0) AS fiber_g \
         FROM food_entries \
         WHERE user_id = $1 AND consumed_at >= $2 AND consumed_at < $3",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_one(db)
    .await
    .context("failed to total food entries")
}

/// Entry count per meal type within `[from, to)`; entries without a meal
/// type are grouped under `None`.
pub async fn meal_counts_between(
    db: impl PgExecutor<'_>,
    user_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<(Option<MealType>, i64)>> {
    sqlx::query_as::<_, (Option<MealType>, i64)>(
        "SELECT meal_type, COUNT(*) FROM food_entries \
         WHERE user_id = $1 AND consumed_at >= $2 AND consumed_at < $3 \
         GROUP BY meal_type ORDER BY meal_type NULLS LAST",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await
    .context("failed to count meals")
}
