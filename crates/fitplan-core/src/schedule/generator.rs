use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, TimeDelta};
use tracing::{debug, warn};
use uuid::Uuid;

use fitplan_db::models::{CompletedWorkoutData, PlanSlot, Subscription, Workout};
use fitplan_db::queries::scheduled_workouts::NewScheduledWorkout;

/// A generated record awaiting the bulk insert.
pub type ScheduledWorkoutDraft = NewScheduledWorkout;

/// Read access to workout templates by id.
pub trait WorkoutLookup {
    fn workout(&self, id: Uuid) -> Option<&Workout>;
}

impl WorkoutLookup for HashMap<Uuid, Workout> {
    fn workout(&self, id: Uuid) -> Option<&Workout> {
        self.get(&id)
    }
}

impl WorkoutLookup for [Workout] {
    fn workout(&self, id: Uuid) -> Option<&Workout> {
        self.iter().find(|w| w.id == id)
    }
}

/// Last day covered by a subscription starting on `start`.
///
/// `None` only when the result falls outside the calendar chrono supports.
pub fn end_date(start: NaiveDate, duration_weeks: i32) -> Option<NaiveDate> {
    let days = u64::try_from(duration_weeks).ok()?.checked_mul(7)?;
    start.checked_add_days(Days::new(days))
}

/// Date of a slot's occurrence for a schedule starting on `start`.
///
/// The week offset picks the week, counted from `start`; the weekday
/// (Sunday = 0) then picks the day inside the Sunday-based calendar week
/// containing that anchor. The result can precede the anchor, and for
/// offset 0 it can precede `start` itself.
pub fn slot_date(start: NaiveDate, week_offset: i32, week_day: i32) -> Option<NaiveDate> {
    let anchor_days = u64::try_from(week_offset).ok()?.checked_mul(7)?;
    let anchor = start.checked_add_days(Days::new(anchor_days))?;
    let delta = i64::from(week_day) - i64::from(anchor.weekday().num_days_from_sunday());
    anchor.checked_add_signed(TimeDelta::days(delta))
}

/// Expand `slots` into drafts for `subscription`.
///
/// Pure: the same inputs always give the same drafts in the same order
/// (week offset, weekday, slot order). Slots whose workout cannot be found
/// are skipped.
pub fn generate<L>(
    subscription: &Subscription,
    slots: &[PlanSlot],
    workouts: &L,
) -> Vec<ScheduledWorkoutDraft>
where
    L: WorkoutLookup + ?Sized,
{
    let mut ordered: Vec<&PlanSlot> = slots.iter().collect();
    ordered.sort_by_key(|s| (s.week_offset, s.week_day, s.slot_order));

    let mut drafts = Vec::with_capacity(ordered.len());
    for slot in ordered {
        let Some(workout) = workouts.workout(slot.workout_id) else {
            debug!(
                slot_id = %slot.id,
                workout_id = %slot.workout_id,
                "skipping slot with dangling workout reference"
            );
            continue;
        };
        let Some(performed_at) =
            slot_date(subscription.start_date, slot.week_offset, slot.week_day)
        else {
            warn!(slot_id = %slot.id, "slot date out of range, skipping");
            continue;
        };

        let effective = slot
            .data_override
            .as_ref()
            .map_or_else(|| workout.workout_data.0.clone(), |o| o.0.clone());

        drafts.push(NewScheduledWorkout {
            user_id: subscription.user_id,
            workout_id: workout.id,
            completed_workout_data: CompletedWorkoutData::snapshot(workout, effective),
            performed_at,
            notes: None,
            plan_id: Some(subscription.plan_id),
            subscription_id: Some(subscription.id),
            slot_id: Some(slot.id),
        });
    }
    drafts
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::types::Json;

    use fitplan_db::models::{
        CardioData, StrengthData, SubscriptionStatus, WorkoutData,
    };

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn workout(name: &str, data: WorkoutData) -> Workout {
        let now = Utc::now();
        Workout {
            id: Uuid::new_v4(),
            name: name.into(),
            category: "test".into(),
            equipment: None,
            description: Some(format!("{name} description")),
            instructions: None,
            workout_data: Json(data),
            created_by: None,
            is_public: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn strength(sets: i32) -> WorkoutData {
        WorkoutData::Strength(StrengthData {
            sets: Some(sets),
            reps: Some(10),
            ..Default::default()
        })
    }

    fn slot(plan_id: Uuid, workout_id: Uuid, week_offset: i32, week_day: i32, order: i32) -> PlanSlot {
        PlanSlot {
            id: Uuid::new_v4(),
            plan_id,
            workout_id,
            week_offset,
            week_day,
            slot_order: order,
            data_override: None,
            created_at: Utc::now(),
        }
    }

    fn subscription(plan_id: Uuid, start: NaiveDate) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id,
            start_date: start,
            end_date: end_date(start, 4).unwrap(),
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn lookup(ws: &[Workout]) -> HashMap<Uuid, Workout> {
        ws.iter().map(|w| (w.id, w.clone())).collect()
    }

    #[test]
    fn midweek_slot_lands_later_in_the_same_week() {
        // 2024-01-01 is a Monday.
        assert_eq!(slot_date(d(2024, 1, 1), 0, 3), Some(d(2024, 1, 3)));
    }

    #[test]
    fn sunday_slot_moves_before_the_start_date() {
        assert_eq!(slot_date(d(2024, 1, 1), 0, 0), Some(d(2023, 12, 31)));
    }

    #[test]
    fn week_offset_anchors_the_week() {
        assert_eq!(slot_date(d(2024, 1, 1), 1, 1), Some(d(2024, 1, 8)));
        assert_eq!(slot_date(d(2024, 1, 1), 2, 6), Some(d(2024, 1, 20)));
        // 2024-02-01 is a Thursday; Monday of the following week is 02-05.
        assert_eq!(slot_date(d(2024, 2, 1), 1, 1), Some(d(2024, 2, 5)));
    }

    #[test]
    fn negative_offset_has_no_date() {
        assert_eq!(slot_date(d(2024, 1, 1), -1, 1), None);
    }

    #[test]
    fn end_date_is_whole_weeks_after_start() {
        let start = d(2024, 1, 1);
        for weeks in [1, 4, 8, 12] {
            let end = end_date(start, weeks).unwrap();
            assert_eq!((end - start).num_days(), i64::from(weeks) * 7);
        }
        assert_eq!(end_date(start, 12), Some(d(2024, 3, 25)));
        assert_eq!(end_date(start, -1), None);
    }

    #[test]
    fn generation_is_deterministic() {
        let plan_id = Uuid::new_v4();
        let squat = workout("Squat", strength(5));
        let run = workout(
            "Run",
            WorkoutData::Cardio(CardioData {
                distance_km: Some(5.0),
                ..Default::default()
            }),
        );
        let slots = vec![
            slot(plan_id, run.id, 1, 2, 0),
            slot(plan_id, squat.id, 0, 1, 1),
            slot(plan_id, squat.id, 0, 1, 0),
        ];
        let sub = subscription(plan_id, d(2024, 1, 1));
        let catalog = lookup(&[squat.clone(), run.clone()]);

        let first = generate(&sub, &slots, &catalog);
        let second = generate(&sub, &slots, &catalog);
        assert_eq!(first, second);

        let order: Vec<Option<Uuid>> = first.iter().map(|r| r.slot_id).collect();
        assert_eq!(order, vec![Some(slots[2].id), Some(slots[1].id), Some(slots[0].id)]);
        assert_eq!(first[2].performed_at, d(2024, 1, 9));
    }

    #[test]
    fn drafts_carry_snapshot_and_back_references() {
        let plan_id = Uuid::new_v4();
        let squat = workout("Squat", strength(5));
        let slots = vec![slot(plan_id, squat.id, 0, 3, 0)];
        let sub = subscription(plan_id, d(2024, 1, 1));

        let drafts = generate(&sub, &slots, &lookup(&[squat.clone()]));
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.user_id, sub.user_id);
        assert_eq!(draft.workout_id, squat.id);
        assert_eq!(draft.plan_id, Some(plan_id));
        assert_eq!(draft.subscription_id, Some(sub.id));
        assert_eq!(draft.slot_id, Some(slots[0].id));
        assert_eq!(draft.performed_at, d(2024, 1, 3));
        assert_eq!(draft.completed_workout_data.name, "Squat");
        assert_eq!(
            draft.completed_workout_data.description.as_deref(),
            Some("Squat description")
        );
        assert_eq!(draft.completed_workout_data.workout_data, strength(5));
        assert!(draft.notes.is_none());
    }

    #[test]
    fn override_replaces_workout_parameters() {
        let plan_id = Uuid::new_v4();
        let squat = workout("Squat", strength(5));
        let mut s = slot(plan_id, squat.id, 0, 1, 0);
        s.data_override = Some(Json(strength(2)));
        let sub = subscription(plan_id, d(2024, 1, 1));

        let drafts = generate(&sub, &[s], &lookup(&[squat]));
        assert_eq!(drafts[0].completed_workout_data.workout_data, strength(2));
    }

    #[test]
    fn dangling_workout_reference_is_skipped() {
        let plan_id = Uuid::new_v4();
        let squat = workout("Squat", strength(5));
        let slots = vec![
            slot(plan_id, Uuid::new_v4(), 0, 1, 0),
            slot(plan_id, squat.id, 0, 2, 0),
        ];
        let sub = subscription(plan_id, d(2024, 1, 1));

        let drafts = generate(&sub, &slots, &lookup(&[squat]));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].slot_id, Some(slots[1].id));
    }

    #[test]
    fn slice_lookup_matches_map_lookup() {
        let plan_id = Uuid::new_v4();
        let squat = workout("Squat", strength(5));
        let slots = vec![slot(plan_id, squat.id, 0, 1, 0)];
        let sub = subscription(plan_id, d(2024, 1, 1));
        let list = vec![squat.clone()];

        assert_eq!(
            generate(&sub, &slots, list.as_slice()),
            generate(&sub, &slots, &lookup(&list))
        );
    }

    #[test]
    fn empty_template_generates_nothing() {
        let sub = subscription(Uuid::new_v4(), d(2024, 1, 1));
        assert!(generate(&sub, &[], &HashMap::<Uuid, Workout>::new()).is_empty());
    }
}
