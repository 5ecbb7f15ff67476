//! On-disk format of a plan file.
//!
//! ```toml
//! [plan]
//! name = "Beginner strength"
//! duration_weeks = 4
//!
//! [[slots]]
//! workout = "Back Squat"
//! week_offset = 0
//! week_day = 1          # 0 = Sunday
//!
//! [slots.override]
//! type = "strength"
//! sets = 3
//! reps = 5
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fitplan_db::models::WorkoutData;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanToml {
    pub plan: PlanMeta,
    #[serde(default)]
    pub slots: Vec<SlotToml>,
}

/// The `[plan]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanMeta {
    /// Present only in exported files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration_weeks: i32,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

/// One `[[slots]]` entry. The workout is referenced by catalog name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotToml {
    pub workout: String,
    pub week_offset: i32,
    pub week_day: i32,
    #[serde(default)]
    pub order: i32,
    #[serde(
        default,
        rename = "override",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_override: Option<WorkoutData>,
}

fn default_public() -> bool {
    true
}
