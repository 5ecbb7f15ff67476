//! Diet diary: food entries, daily summaries, nutrition goals and the
//! recent-food list.
//!
//! Entry days are UTC calendar days.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use fitplan_db::models::{FoodEntry, MealType, NutritionGoal, UserRecentFood};
use fitplan_db::queries::food_entries::{self as entries, EntryFilter, FoodEntryValues, NutrientTotals};
use fitplan_db::queries::nutrition_goals::{self as goals, GoalTargets};
use fitplan_db::queries::recent_foods;

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 500;

/// A diary entry as submitted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntryInput {
    pub fdc_id: i64,
    pub food_name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    pub serving_size: f64,
    pub serving_unit: String,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    /// Defaults to the time of the request.
    #[serde(default)]
    pub consumed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FoodEntryInput {
    fn validate(&self) -> ServiceResult<()> {
        if self.food_name.trim().is_empty() {
            return Err(ServiceError::invalid("food_name must not be blank"));
        }
        if self.serving_unit.trim().is_empty() {
            return Err(ServiceError::invalid("serving_unit must not be blank"));
        }
        if !self.serving_size.is_finite() || self.serving_size <= 0.0 {
            return Err(ServiceError::invalid("serving_size must be a positive number"));
        }
        let nutrients = [
            ("calories", self.calories),
            ("protein_g", self.protein_g),
            ("carbs_g", self.carbs_g),
            ("fat_g", self.fat_g),
            ("fiber_g", self.fiber_g),
        ];
        for (field, v) in nutrients {
            if v.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(ServiceError::invalid(format!(
                    "{field} must be a finite, non-negative number"
                )));
            }
        }
        Ok(())
    }

    fn values(&self, now: DateTime<Utc>) -> FoodEntryValues<'_> {
        FoodEntryValues {
            fdc_id: self.fdc_id,
            food_name: self.food_name.trim(),
            data_type: self.data_type.as_deref(),
            serving_size: self.serving_size,
            serving_unit: self.serving_unit.trim(),
            calories: self.calories,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            fiber_g: self.fiber_g,
            consumed_at: self.consumed_at.unwrap_or(now),
            meal_type: self.meal_type,
            notes: self.notes.as_deref(),
        }
    }
}

/// Which entries to list. `date` selects one day and wins over
/// `from`/`to`, which are inclusive days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl EntryQuery {
    fn to_filter(&self, user_id: Uuid) -> ServiceResult<EntryFilter> {
        let (from, to) = match self.date {
            Some(day) => (Some(day), Some(day)),
            None => (self.from, self.to),
        };
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ServiceError::invalid(format!("from {f} is after to {t}")));
            }
        }
        Ok(EntryFilter {
            user_id,
            from: from.map(start_of_day).transpose()?,
            to: to.map(end_of_day).transpose()?,
            meal_type: self.meal_type,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        })
    }
}

fn start_of_day(day: NaiveDate) -> ServiceResult<DateTime<Utc>> {
    day.and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .ok_or_else(|| ServiceError::invalid(format!("date {day} is out of range")))
}

/// Exclusive upper bound: midnight at the start of the following day.
fn end_of_day(day: NaiveDate) -> ServiceResult<DateTime<Utc>> {
    let next = day
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ServiceError::invalid(format!("date {day} is out of range")))?;
    start_of_day(next)
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Insert an entry and bump the food on the user's recent list.
pub async fn create_entry(
    pool: &PgPool,
    user_id: Uuid,
    input: &FoodEntryInput,
) -> ServiceResult<FoodEntry> {
    input.validate()?;

    let mut tx = pool.begin().await?;
    let entry = entries::insert_entry(&mut *tx, user_id, &input.values(Utc::now())).await?;
    recent_foods::track(&mut *tx, user_id, entry.fdc_id, &entry.food_name).await?;
    tx.commit().await?;

    info!(entry_id = %entry.id, %user_id, fdc_id = entry.fdc_id, "food entry created");
    Ok(entry)
}

pub async fn get_entry(pool: &PgPool, id: Uuid, user_id: Uuid) -> ServiceResult<FoodEntry> {
    entries::get_entry(pool, id, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("food entry {id}")))
}

pub async fn list_entries(
    pool: &PgPool,
    user_id: Uuid,
    query: &EntryQuery,
) -> ServiceResult<Vec<FoodEntry>> {
    let filter = query.to_filter(user_id)?;
    Ok(entries::list_entries(pool, &filter).await?)
}

/// Replace every field of an owned entry.
pub async fn update_entry(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    input: &FoodEntryInput,
) -> ServiceResult<FoodEntry> {
    input.validate()?;
    let current = get_entry(pool, id, user_id).await?;
    let updated = entries::update_entry(pool, id, user_id, &input.values(current.consumed_at))
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("food entry {id}")))?;
    info!(entry_id = %id, %user_id, "food entry updated");
    Ok(updated)
}

pub async fn delete_entry(pool: &PgPool, id: Uuid, user_id: Uuid) -> ServiceResult<()> {
    if !entries::delete_entry(pool, id, user_id).await? {
        return Err(ServiceError::not_found(format!("food entry {id}")));
    }
    info!(entry_id = %id, %user_id, "food entry deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Daily summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealCount {
    pub meal_type: Option<MealType>,
    pub entries: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub totals: NutrientTotals,
    pub meals: Vec<MealCount>,
    pub goal: Option<NutritionGoal>,
    /// Goal minus totals, for the targets the goal sets.
    pub remaining: Option<GoalTargets>,
}

pub async fn daily_summary(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> ServiceResult<DailySummary> {
    let (from, to) = (start_of_day(date)?, end_of_day(date)?);
    let totals = entries::totals_between(pool, user_id, from, to).await?;
    let meals = entries::meal_counts_between(pool, user_id, from, to)
        .await?
        .into_iter()
        .map(|(meal_type, entries)| MealCount { meal_type, entries })
        .collect();
    let goal = goals::active_goal(pool, user_id).await?;
    let remaining = goal.as_ref().map(|g| remaining_for(g, &totals));

    Ok(DailySummary {
        date,
        totals,
        meals,
        goal,
        remaining,
    })
}

fn remaining_for(goal: &NutritionGoal, totals: &NutrientTotals) -> GoalTargets {
    GoalTargets {
        daily_calories: goal.daily_calories.map(|t| t - totals.calories),
        daily_protein_g: goal.daily_protein_g.map(|t| t - totals.protein_g),
        daily_carbs_g: goal.daily_carbs_g.map(|t| t - totals.carbs_g),
        daily_fat_g: goal.daily_fat_g.map(|t| t - totals.fat_g),
    }
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

fn validate_targets(t: &GoalTargets) -> ServiceResult<()> {
    let fields = [
        ("daily_calories", t.daily_calories),
        ("daily_protein_g", t.daily_protein_g),
        ("daily_carbs_g", t.daily_carbs_g),
        ("daily_fat_g", t.daily_fat_g),
    ];
    if fields.iter().all(|(_, v)| v.is_none()) {
        return Err(ServiceError::invalid("a goal needs at least one target"));
    }
    for (field, v) in fields {
        if v.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(ServiceError::invalid(format!(
                "{field} must be a finite, non-negative number"
            )));
        }
    }
    Ok(())
}

/// Store a goal. An active goal replaces the user's current one.
pub async fn create_goal(
    pool: &PgPool,
    user_id: Uuid,
    targets: &GoalTargets,
    is_active: bool,
) -> ServiceResult<NutritionGoal> {
    validate_targets(targets)?;

    let mut tx = pool.begin().await?;
    let deactivated = if is_active {
        goals::deactivate_all(&mut *tx, user_id).await?
    } else {
        0
    };
    let goal = goals::insert_goal(&mut *tx, user_id, targets, is_active).await?;
    tx.commit().await?;

    info!(goal_id = %goal.id, %user_id, is_active, deactivated, "nutrition goal created");
    Ok(goal)
}

pub async fn active_goal(pool: &PgPool, user_id: Uuid) -> ServiceResult<Option<NutritionGoal>> {
    Ok(goals::active_goal(pool, user_id).await?)
}

pub async fn list_goals(pool: &PgPool, user_id: Uuid) -> ServiceResult<Vec<NutritionGoal>> {
    Ok(goals::list_goals(pool, user_id).await?)
}

/// Make an owned goal the active one.
pub async fn activate_goal(pool: &PgPool, id: Uuid, user_id: Uuid) -> ServiceResult<NutritionGoal> {
    let mut tx = pool.begin().await?;
    goals::deactivate_all(&mut *tx, user_id).await?;
    let goal = goals::set_active(&mut *tx, id, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("nutrition goal {id}")))?;
    tx.commit().await?;

    info!(goal_id = %id, %user_id, "nutrition goal activated");
    Ok(goal)
}

// ---------------------------------------------------------------------------
// Recent foods
// ---------------------------------------------------------------------------

pub async fn recent_foods(pool: &PgPool, user_id: Uuid, limit: i64) -> ServiceResult<Vec<UserRecentFood>> {
    Ok(recent_foods::recent(pool, user_id, limit.clamp(1, MAX_PAGE_SIZE)).await?)
}

pub async fn frequent_foods(pool: &PgPool, user_id: Uuid, limit: i64) -> ServiceResult<Vec<UserRecentFood>> {
    Ok(recent_foods::frequent(pool, user_id, limit.clamp(1, MAX_PAGE_SIZE)).await?)
}
