use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Text-backed enums
// ---------------------------------------------------------------------------

/// Error returned when a text column or user input names an unknown variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Generates `as_str`, `Display`, `FromStr` and `ALL` for a unit-only enum
/// whose text form is its snake_case name.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(EnumParseError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Lifecycle status of a subscription. Every transition is an explicit
/// command; nothing moves a subscription between states automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

text_enum!(SubscriptionStatus, "subscription status", {
    Active => "active",
    Paused => "paused",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Whether the user has done a scheduled workout yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    Pending,
    Complete,
    Incomplete,
}

text_enum!(CompletionState, "completion state", {
    Pending => "pending",
    Complete => "complete",
    Incomplete => "incomplete",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

text_enum!(MealType, "meal type", {
    Breakfast => "breakfast",
    Lunch => "lunch",
    Dinner => "dinner",
    Snack => "snack",
});

// ---------------------------------------------------------------------------
// Workout parameters (JSONB)
// ---------------------------------------------------------------------------

/// Structured parameters of a workout, discriminated by `"type"`.
///
/// Stored in `workouts.workout_data`, `plan_slots.data_override` and inside
/// the snapshot of every scheduled workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutData {
    Strength(StrengthData),
    Cardio(CardioData),
    Flexibility(FlexibilityData),
    Custom(CustomData),
}

impl WorkoutData {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Strength(_) => "strength",
            Self::Cardio(_) => "cardio",
            Self::Flexibility(_) => "flexibility",
            Self::Custom(_) => "custom",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardioData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_heart_rate: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlexibilityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// Frozen copy of a workout as it looked when a scheduled record was made.
///
/// Editing or deleting the source workout never touches these. The
/// `performed_*` fields are filled in later when the user logs a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorkoutData {
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub workout_data: WorkoutData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_sets: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_reps: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_duration_seconds: Option<i32>,
}

impl CompletedWorkoutData {
    /// Snapshot `workout`, with `workout_data` as the effective parameters.
    pub fn snapshot(workout: &Workout, workout_data: WorkoutData) -> Self {
        Self {
            name: workout.name.clone(),
            category: workout.category.clone(),
            equipment: workout.equipment.clone(),
            description: workout.description.clone(),
            instructions: workout.instructions.clone(),
            workout_data,
            performed_sets: None,
            performed_reps: None,
            performed_weight_kg: None,
            performed_distance_km: None,
            performed_duration_seconds: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub equipment: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub workout_data: Json<WorkoutData>,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_weeks: i32,
    pub created_by: Option<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    /// Public workouts are visible to everyone, private ones to their creator.
    pub fn visible_to(&self, user_id: Uuid) -> bool {
        self.is_public || self.created_by == Some(user_id)
    }
}

impl Plan {
    pub fn visible_to(&self, user_id: Uuid) -> bool {
        self.is_public || self.created_by == Some(user_id)
    }
}

/// One (workout, week offset, weekday, order) cell of a plan template.
/// `week_day` counts from Sunday = 0.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanSlot {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub workout_id: Uuid,
    pub week_offset: i32,
    pub week_day: i32,
    pub slot_order: i32,
    pub data_override: Option<Json<WorkoutData>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dated workout occurrence owned by a user. The plan, subscription and
/// slot references are all null for ad-hoc entries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledWorkout {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workout_id: Uuid,
    pub completed_workout_data: Json<CompletedWorkoutData>,
    pub performed_at: NaiveDate,
    pub notes: Option<String>,
    pub completion_state: CompletionState,
    pub plan_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fdc_id: i64,
    pub food_name: String,
    pub data_type: Option<String>,
    pub serving_size: f64,
    pub serving_unit: String,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub consumed_at: DateTime<Utc>,
    pub meal_type: Option<MealType>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub daily_calories: Option<f64>,
    pub daily_protein_g: Option<f64>,
    pub daily_carbs_g: Option<f64>,
    pub daily_fat_g: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecentFood {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fdc_id: i64,
    pub food_name: String,
    pub times_used: i32,
    pub last_used_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_enums_roundtrip() {
        for v in SubscriptionStatus::ALL {
            assert_eq!(v.to_string().parse::<SubscriptionStatus>().unwrap(), *v);
        }
        for v in CompletionState::ALL {
            assert_eq!(v.to_string().parse::<CompletionState>().unwrap(), *v);
        }
        for v in MealType::ALL {
            assert_eq!(v.as_str().parse::<MealType>().unwrap(), *v);
        }
    }

    #[test]
    fn parse_error_names_the_kind() {
        let err = "archived".parse::<SubscriptionStatus>().unwrap_err();
        assert_eq!(err.kind, "subscription status");
        assert_eq!(err.to_string(), "invalid subscription status: \"archived\"");
    }

    #[test]
    fn workout_data_uses_type_tag() {
        let data = WorkoutData::Strength(StrengthData {
            sets: Some(5),
            reps: Some(5),
            weight_kg: Some(100.0),
            rest_seconds: None,
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "strength");
        assert_eq!(json["sets"], 5);
        assert!(json.get("rest_seconds").is_none());
    }

    #[test]
    fn workout_data_rejects_unknown_type() {
        let err = serde_json::from_str::<WorkoutData>(r#"{"type":"yoga","minutes":30}"#);
        assert!(err.is_err());
    }

    #[test]
    fn custom_metrics_default_to_empty() {
        let data: WorkoutData = serde_json::from_str(r#"{"type":"custom"}"#).unwrap();
        match data {
            WorkoutData::Custom(c) => assert!(c.metrics.is_empty()),
            other => panic!("unexpected variant {}", other.kind()),
        }
    }

    #[test]
    fn snapshot_leaves_performed_values_empty() {
        let now = Utc::now();
        let workout = Workout {
            id: Uuid::new_v4(),
            name: "Back Squat".into(),
            category: "legs".into(),
            equipment: Some("barbell".into()),
            description: None,
            instructions: Some("Brace, descend, drive up.".into()),
            workout_data: Json(WorkoutData::Strength(StrengthData::default())),
            created_by: None,
            is_public: true,
            created_at: now,
            updated_at: now,
        };
        let override_data = WorkoutData::Strength(StrengthData {
            sets: Some(3),
            ..Default::default()
        });
        let snap = CompletedWorkoutData::snapshot(&workout, override_data.clone());
        assert_eq!(snap.name, "Back Squat");
        assert_eq!(snap.equipment.as_deref(), Some("barbell"));
        assert_eq!(snap.workout_data, override_data);
        assert!(snap.performed_sets.is_none());
        assert!(snap.performed_duration_seconds.is_none());
    }

    #[test]
    fn private_workout_visible_only_to_creator() {
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let mut workout = Workout {
            id: Uuid::new_v4(),
            name: "Tempo Run".into(),
            category: "cardio".into(),
            equipment: None,
            description: None,
            instructions: None,
            workout_data: Json(WorkoutData::Cardio(CardioData::default())),
            created_by: Some(owner),
            is_public: false,
            created_at: now,
            updated_at: now,
        };
        assert!(workout.visible_to(owner));
        assert!(!workout.visible_to(Uuid::new_v4()));

        workout.is_public = true;
        assert!(workout.visible_to(Uuid::new_v4()));
    }
}
