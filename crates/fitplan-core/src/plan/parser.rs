//! Plan file parsing and validation.
//!
//! Checks that the plan lasts at least a week, has at least one slot, and
//! that every slot sits inside the plan on a real weekday with a valid
//! override. Workout names are resolved later, against the database.

use thiserror::Error;

use fitplan_db::models::WorkoutData;

use super::toml_format::PlanToml;
use crate::workout::{WorkoutDataError, validate_workout_data};

#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("plan name must not be blank")]
    BlankName,

    #[error("duration_weeks must be at least 1, got {0}")]
    InvalidDuration(i32),

    #[error("plan must contain at least one slot")]
    NoSlots,

    #[error("slot #{slot}: workout name must not be blank")]
    BlankWorkout { slot: usize },

    #[error("slot #{slot}: week_day {value} is outside 0..=6 (0 = Sunday)")]
    InvalidWeekDay { slot: usize, value: i32 },

    #[error("slot #{slot}: week_offset {value} is outside 0..{duration_weeks}")]
    WeekOffsetOutOfRange {
        slot: usize,
        value: i32,
        duration_weeks: i32,
    },

    #[error("slot #{slot}: invalid override: {source}")]
    InvalidOverride {
        slot: usize,
        #[source]
        source: WorkoutDataError,
    },
}

/// Parse and validate the contents of a plan file.
pub fn parse_plan_toml(content: &str) -> Result<PlanToml, PlanParseError> {
    let plan: PlanToml = toml::from_str(content)?;
    validate_plan(&plan)?;
    Ok(plan)
}

/// Check a plan that did not come through [`parse_plan_toml`], such as a
/// JSON request body.
pub fn validate_plan(plan: &PlanToml) -> Result<(), PlanParseError> {
    if plan.plan.name.trim().is_empty() {
        return Err(PlanParseError::BlankName);
    }
    if plan.plan.duration_weeks < 1 {
        return Err(PlanParseError::InvalidDuration(plan.plan.duration_weeks));
    }
    if plan.slots.is_empty() {
        return Err(PlanParseError::NoSlots);
    }

    for (i, slot) in plan.slots.iter().enumerate() {
        let n = i + 1;
        if slot.workout.trim().is_empty() {
            return Err(PlanParseError::BlankWorkout { slot: n });
        }
        check_slot(
            n,
            slot.week_offset,
            slot.week_day,
            slot.data_override.as_ref(),
            plan.plan.duration_weeks,
        )?;
    }
    Ok(())
}

/// Placement and override checks shared by file parsing and slot
/// replacement. `slot` is the 1-based position used in messages.
pub fn check_slot(
    slot: usize,
    week_offset: i32,
    week_day: i32,
    data_override: Option<&WorkoutData>,
    duration_weeks: i32,
) -> Result<(), PlanParseError> {
    if !(0..=6).contains(&week_day) {
        return Err(PlanParseError::InvalidWeekDay {
            slot,
            value: week_day,
        });
    }
    if !(0..duration_weeks).contains(&week_offset) {
        return Err(PlanParseError::WeekOffsetOutOfRange {
            slot,
            value: week_offset,
            duration_weeks,
        });
    }
    if let Some(data) = data_override {
        validate_workout_data(data)
            .map_err(|source| PlanParseError::InvalidOverride { slot, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_slot(duration: i32, slot: &str) -> String {
        format!(
            r#"
[plan]
name = "Test"
duration_weeks = {duration}

[[slots]]
{slot}
"#
        )
    }

    #[test]
    fn valid_plan() {
        let text = r#"
[plan]
name = "Four week base"
description = "Run, lift, stretch."
duration_weeks = 4

[[slots]]
workout = "Easy Run"
week_offset = 0
week_day = 1

[[slots]]
workout = "Back Squat"
week_offset = 3
week_day = 6
order = 1

[slots.override]
type = "strength"
sets = 3
"#;
        let plan = parse_plan_toml(text).unwrap();
        assert_eq!(plan.plan.duration_weeks, 4);
        assert_eq!(plan.slots.len(), 2);
    }

    #[test]
    fn rejects_no_slots() {
        let err = parse_plan_toml("[plan]\nname = \"x\"\nduration_weeks = 1\n").unwrap_err();
        assert!(matches!(err, PlanParseError::NoSlots));
    }

    #[test]
    fn rejects_zero_duration() {
        let text = plan_with_slot(0, "workout = \"a\"\nweek_offset = 0\nweek_day = 0");
        assert!(matches!(
            parse_plan_toml(&text),
            Err(PlanParseError::InvalidDuration(0))
        ));
    }

    #[test]
    fn rejects_bad_week_day() {
        let text = plan_with_slot(1, "workout = \"a\"\nweek_offset = 0\nweek_day = 7");
        let err = parse_plan_toml(&text).unwrap_err();
        assert!(matches!(
            err,
            PlanParseError::InvalidWeekDay { slot: 1, value: 7 }
        ));
        assert!(err.to_string().contains("0 = Sunday"));
    }

    #[test]
    fn rejects_offset_past_duration() {
        let text = plan_with_slot(2, "workout = \"a\"\nweek_offset = 2\nweek_day = 3");
        assert!(matches!(
            parse_plan_toml(&text),
            Err(PlanParseError::WeekOffsetOutOfRange { value: 2, .. })
        ));
        let negative = plan_with_slot(2, "workout = \"a\"\nweek_offset = -1\nweek_day = 3");
        assert!(parse_plan_toml(&negative).is_err());
    }

    #[test]
    fn rejects_invalid_override() {
        let text = plan_with_slot(
            1,
            "workout = \"a\"\nweek_offset = 0\nweek_day = 3\n\n[slots.override]\ntype = \"flexibility\"\nhold_count = -2",
        );
        let err = parse_plan_toml(&text).unwrap_err();
        assert!(matches!(err, PlanParseError::InvalidOverride { slot: 1, .. }));
    }

    #[test]
    fn rejects_blank_workout_and_name() {
        let text = plan_with_slot(1, "workout = \" \"\nweek_offset = 0\nweek_day = 3");
        assert!(matches!(
            parse_plan_toml(&text),
            Err(PlanParseError::BlankWorkout { slot: 1 })
        ));
        let text = "[plan]\nname = \"\"\nduration_weeks = 1\n[[slots]]\nworkout = \"a\"\nweek_offset = 0\nweek_day = 0\n";
        assert!(matches!(parse_plan_toml(text), Err(PlanParseError::BlankName)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            parse_plan_toml("[plan\nname="),
            Err(PlanParseError::TomlError(_))
        ));
    }
}
