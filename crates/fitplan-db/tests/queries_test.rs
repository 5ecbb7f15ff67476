//! Query-layer behaviour that the services above rely on.

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use fitplan_db::models::{CompletedWorkoutData, CompletionState, MealType, WorkoutData};
use fitplan_db::queries::food_entries::{self, EntryFilter, FoodEntryValues};
use fitplan_db::queries::nutrition_goals::{self, GoalTargets};
use fitplan_db::queries::scheduled_workouts::{self, NewScheduledWorkout, ScheduledFilter};
use fitplan_db::queries::{plan_slots, recent_foods, subscriptions};
use fitplan_test_utils::{create_test_db, date, drop_test_db, seed_plan, seed_user, seed_workout};

#[tokio::test]
async fn slots_come_back_in_generation_order() {
    let (pool, db_name) = create_test_db().await;
    let w = seed_workout(&pool, "Row").await;
    let plan = seed_plan(&pool, 4, &[(w.id, 2, 1), (w.id, 0, 5), (w.id, 0, 1), (w.id, 1, 0)]).await;

    let slots = plan_slots::list_slots_for_plan(&pool, plan.id).await.unwrap();
    let keys: Vec<(i32, i32)> = slots.iter().map(|s| (s.week_offset, s.week_day)).collect();
    assert_eq!(keys, vec![(0, 1), (0, 5), (1, 0), (2, 1)]);

    let removed = plan_slots::delete_slots_for_plan(&pool, plan.id).await.unwrap();
    assert_eq!(removed, 4);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn bulk_insert_skips_existing_occurrences() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "ada").await;
    let w = seed_workout(&pool, "Squat").await;
    let plan = seed_plan(&pool, 1, &[(w.id, 0, 1)]).await;
    let slot = plan_slots::list_slots_for_plan(&pool, plan.id).await.unwrap().remove(0);
    let sub = subscriptions::insert_subscription(&pool, user.id, plan.id, date(2024, 1, 1), date(2024, 1, 8))
        .await
        .unwrap();

    let row = NewScheduledWorkout {
        user_id: user.id,
        workout_id: w.id,
        completed_workout_data: CompletedWorkoutData::snapshot(&w, w.workout_data.0.clone()),
        performed_at: date(2024, 1, 1),
        notes: None,
        plan_id: Some(plan.id),
        subscription_id: Some(sub.id),
        slot_id: Some(slot.id),
    };

    let mut conn = pool.acquire().await.unwrap();
    let first = scheduled_workouts::bulk_insert(&mut conn, std::slice::from_ref(&row)).await.unwrap();
    let second = scheduled_workouts::bulk_insert(&mut conn, &[row.clone(), row]).await.unwrap();
    drop(conn);

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(scheduled_workouts::count_for_subscription(&pool, sub.id).await.unwrap(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ad_hoc_records_do_not_collide() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "grace").await;
    let w = seed_workout(&pool, "Deadlift").await;

    let row = NewScheduledWorkout {
        user_id: user.id,
        workout_id: w.id,
        completed_workout_data: CompletedWorkoutData::snapshot(&w, w.workout_data.0.clone()),
        performed_at: date(2024, 3, 4),
        notes: Some("felt heavy".into()),
        plan_id: None,
        subscription_id: None,
        slot_id: None,
    };
    scheduled_workouts::insert_one(&pool, &row).await.unwrap();
    scheduled_workouts::insert_one(&pool, &row).await.unwrap();

    let all = scheduled_workouts::list_scheduled(&pool, &ScheduledFilter::for_user(user.id))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|r| r.completion_state == CompletionState::Pending));

    let stats = scheduled_workouts::stats(&pool, user.id, date(2024, 1, 1)).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.distinct_days, 1);
    assert_eq!(stats.distinct_workouts, 1);
    assert_eq!(stats.completed, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_scheduled_filters_by_date_window() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "linus").await;
    let w = seed_workout(&pool, "Bench").await;

    for day in [1, 5, 9, 13] {
        let row = NewScheduledWorkout {
            user_id: user.id,
            workout_id: w.id,
            completed_workout_data: CompletedWorkoutData::snapshot(&w, w.workout_data.0.clone()),
            performed_at: date(2024, 5, day),
            notes: None,
            plan_id: None,
            subscription_id: None,
            slot_id: None,
        };
        scheduled_workouts::insert_one(&pool, &row).await.unwrap();
    }

    let filter = ScheduledFilter {
        from: Some(date(2024, 5, 5)),
        to: Some(date(2024, 5, 9)),
        ..ScheduledFilter::for_user(user.id)
    };
    let rows = scheduled_workouts::list_scheduled(&pool, &filter).await.unwrap();
    let dates: Vec<_> = rows.iter().map(|r| r.performed_at).collect();
    assert_eq!(dates, vec![date(2024, 5, 9), date(2024, 5, 5)]);

    let other_user = ScheduledFilter::for_user(Uuid::new_v4());
    assert!(scheduled_workouts::list_scheduled(&pool, &other_user).await.unwrap().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn recent_food_tracking_bumps_counter() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "margaret").await;

    recent_foods::track(&pool, user.id, 171705, "Oats").await.unwrap();
    recent_foods::track(&pool, user.id, 171705, "Oats, rolled").await.unwrap();
    recent_foods::track(&pool, user.id, 173944, "Banana").await.unwrap();

    let frequent = recent_foods::frequent(&pool, user.id, 10).await.unwrap();
    assert_eq!(frequent[0].fdc_id, 171705);
    assert_eq!(frequent[0].times_used, 2);
    assert_eq!(frequent[0].food_name, "Oats, rolled");

    let recent = recent_foods::recent(&pool, user.id, 1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].fdc_id, 173944);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn only_one_goal_may_be_active() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "barbara").await;
    let targets = GoalTargets {
        daily_calories: Some(2200.0),
        ..Default::default()
    };

    nutrition_goals::insert_goal(&pool, user.id, &targets, true).await.unwrap();
    let second = nutrition_goals::insert_goal(&pool, user.id, &targets, true).await;
    assert!(second.is_err(), "partial unique index must reject a second active goal");

    nutrition_goals::deactivate_all(&pool, user.id).await.unwrap();
    assert!(nutrition_goals::active_goal(&pool, user.id).await.unwrap().is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn totals_treat_missing_nutrients_as_zero() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "edsger").await;
    let morning = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

    let mut values = FoodEntryValues {
        fdc_id: 1,
        food_name: "Egg",
        data_type: Some("Foundation"),
        serving_size: 50.0,
        serving_unit: "g",
        calories: Some(72.0),
        protein_g: Some(6.3),
        carbs_g: None,
        fat_g: Some(4.8),
        fiber_g: None,
        consumed_at: morning,
        meal_type: Some(MealType::Breakfast),
        notes: None,
    };
    food_entries::insert_entry(&pool, user.id, &values).await.unwrap();
    values.calories = None;
    values.meal_type = None;
    food_entries::insert_entry(&pool, user.id, &values).await.unwrap();

    let totals = food_entries::totals_between(&pool, user.id, morning - Duration::hours(8), morning + Duration::hours(16))
        .await
        .unwrap();
    assert_eq!(totals.entries, 2);
    assert!((totals.calories - 72.0).abs() < 1e-9);
    assert!((totals.protein_g - 12.6).abs() < 1e-9);
    assert_eq!(totals.carbs_g, 0.0);

    let meals = food_entries::meal_counts_between(&pool, user.id, morning - Duration::hours(8), morning + Duration::hours(16))
        .await
        .unwrap();
    assert_eq!(meals, vec![(Some(MealType::Breakfast), 1), (None, 1)]);

    let filter = EntryFilter {
        user_id: user.id,
        from: None,
        to: None,
        meal_type: Some(MealType::Breakfast),
        limit: 10,
        offset: 0,
    };
    assert_eq!(food_entries::list_entries(&pool, &filter).await.unwrap().len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[test]
fn workout_data_json_survives_snapshot() {
    let data: WorkoutData = serde_json::from_str(r#"{"type":"cardio","distance_km":5.0}"#).unwrap();
    assert_eq!(data.kind(), "cardio");
}
