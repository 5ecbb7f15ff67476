//! Export a stored plan back to its TOML authoring format.

use std::collections::HashMap;

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use fitplan_db::models::{Plan, PlanSlot};
use fitplan_db::queries::workouts;

use super::service::get_plan_with_slots;
use super::toml_format::{PlanMeta, PlanToml, SlotToml};
use crate::error::{ServiceError, ServiceResult};

/// Build the file representation of a plan. `names` maps workout ids to
/// catalog names; a slot whose workout is missing from it cannot be
/// expressed and fails the export.
pub fn plan_to_toml(
    plan: &Plan,
    slots: &[PlanSlot],
    names: &HashMap<Uuid, String>,
) -> ServiceResult<PlanToml> {
    let mut out = Vec::with_capacity(slots.len());
    for slot in slots {
        let workout = names.get(&slot.workout_id).ok_or_else(|| {
            ServiceError::invalid(format!(
                "slot {} references deleted workout {}",
                slot.id, slot.workout_id
            ))
        })?;
        out.push(SlotToml {
            workout: workout.clone(),
            week_offset: slot.week_offset,
            week_day: slot.week_day,
            order: slot.slot_order,
            data_override: slot.data_override.as_ref().map(|o| o.0.clone()),
        });
    }

    Ok(PlanToml {
        plan: PlanMeta {
            id: Some(plan.id),
            name: plan.name.clone(),
            description: plan.description.clone(),
            duration_weeks: plan.duration_weeks,
            is_public: plan.is_public,
        },
        slots: out,
    })
}

/// Render `plan_id` as a plan file that `fitplan plan create` accepts.
pub async fn export_plan_toml(pool: &PgPool, plan_id: Uuid) -> ServiceResult<String> {
    let (plan, slots) = get_plan_with_slots(pool, plan_id).await?;

    let ids: Vec<Uuid> = slots.iter().map(|s| s.workout_id).collect();
    let names: HashMap<Uuid, String> = workouts::get_workouts_by_ids(pool, &ids)
        .await?
        .into_iter()
        .map(|w| (w.id, w.name))
        .collect();

    let file = plan_to_toml(&plan, &slots, &names)?;
    let text = toml::to_string_pretty(&file).context("failed to serialize plan TOML")?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;

    use fitplan_db::models::{FlexibilityData, WorkoutData};

    use super::*;
    use crate::plan::parse_plan_toml;

    fn plan() -> Plan {
        let now = Utc::now();
        Plan {
            id: Uuid::new_v4(),
            name: "Mobility".into(),
            description: None,
            duration_weeks: 2,
            created_by: None,
            is_public: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn slot(plan_id: Uuid, workout_id: Uuid, week_offset: i32, week_day: i32) -> PlanSlot {
        PlanSlot {
            id: Uuid::new_v4(),
            plan_id,
            workout_id,
            week_offset,
            week_day,
            slot_order: 0,
            data_override: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn exported_file_parses_back() {
        let p = plan();
        let stretch = Uuid::new_v4();
        let mut s2 = slot(p.id, stretch, 1, 4);
        s2.data_override = Some(Json(WorkoutData::Flexibility(FlexibilityData {
            duration_seconds: Some(45),
            hold_count: Some(3),
        })));
        let slots = vec![slot(p.id, stretch, 0, 2), s2];
        let names = HashMap::from([(stretch, "Hip Opener".to_owned())]);

        let file = plan_to_toml(&p, &slots, &names).unwrap();
        let text = toml::to_string_pretty(&file).unwrap();
        let parsed = parse_plan_toml(&text).unwrap();

        assert_eq!(parsed, file);
        assert_eq!(parsed.plan.id, Some(p.id));
        assert_eq!(parsed.slots[1].workout, "Hip Opener");
    }

    #[test]
    fn deleted_workout_fails_export() {
        let p = plan();
        let slots = vec![slot(p.id, Uuid::new_v4(), 0, 1)];
        let err = plan_to_toml(&p, &slots, &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("deleted workout"));
    }
}
