//! Diet diary services against a real database.

use chrono::{TimeZone, Utc};

use fitplan_core::ServiceError;
use fitplan_core::diet::{self, EntryQuery, FoodEntryInput};
use fitplan_db::models::MealType;
use fitplan_db::queries::nutrition_goals::GoalTargets;
use fitplan_test_utils::{create_test_db, date, drop_test_db, seed_user};

fn entry(fdc_id: i64, name: &str, calories: f64, hour: u32, meal: MealType) -> FoodEntryInput {
    FoodEntryInput {
        fdc_id,
        food_name: name.into(),
        data_type: Some("Foundation".into()),
        serving_size: 100.0,
        serving_unit: "g".into(),
        calories: Some(calories),
        protein_g: Some(10.0),
        carbs_g: None,
        fat_g: Some(2.0),
        fiber_g: None,
        consumed_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()),
        meal_type: Some(meal),
        notes: None,
    }
}

#[tokio::test]
async fn entries_feed_summary_and_recent_foods() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "eater").await;

    diet::create_entry(&pool, user.id, &entry(1, "Oats", 300.0, 7, MealType::Breakfast))
        .await
        .unwrap();
    diet::create_entry(&pool, user.id, &entry(2, "Rice", 400.0, 12, MealType::Lunch))
        .await
        .unwrap();
    diet::create_entry(&pool, user.id, &entry(1, "Oats", 150.0, 16, MealType::Snack))
        .await
        .unwrap();
    // Next day, outside the summary window.
    let mut late = entry(3, "Apple", 80.0, 0, MealType::Snack);
    late.consumed_at = Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
    diet::create_entry(&pool, user.id, &late).await.unwrap();

    diet::create_goal(
        &pool,
        user.id,
        &GoalTargets {
            daily_calories: Some(2000.0),
            ..Default::default()
        },
        true,
    )
    .await
    .unwrap();

    let summary = diet::daily_summary(&pool, user.id, date(2024, 3, 1)).await.unwrap();
    assert_eq!(summary.totals.entries, 3);
    assert_eq!(summary.totals.calories, 850.0);
    assert_eq!(summary.totals.protein_g, 30.0);
    assert_eq!(summary.meals.len(), 3);
    assert_eq!(summary.remaining.unwrap().daily_calories, Some(1150.0));

    let day = diet::list_entries(
        &pool,
        user.id,
        &EntryQuery {
            date: Some(date(2024, 3, 1)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(day.len(), 3);
    assert_eq!(day[0].food_name, "Oats");
    assert_eq!(day[0].meal_type, Some(MealType::Snack));

    let frequent = diet::frequent_foods(&pool, user.id, 10).await.unwrap();
    assert_eq!(frequent[0].fdc_id, 1);
    assert_eq!(frequent[0].times_used, 2);
    let recent = diet::recent_foods(&pool, user.id, 1).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].fdc_id, 3);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_and_delete_are_owner_scoped() {
    let (pool, db_name) = create_test_db().await;
    let owner = seed_user(&pool, "owner").await;
    let other = seed_user(&pool, "other").await;
    let created = diet::create_entry(&pool, owner.id, &entry(1, "Oats", 300.0, 7, MealType::Breakfast))
        .await
        .unwrap();

    let mut changed = entry(1, "Oats", 350.0, 7, MealType::Breakfast);
    changed.consumed_at = None;
    changed.notes = Some("with milk".into());

    let err = diet::update_entry(&pool, created.id, other.id, &changed).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let updated = diet::update_entry(&pool, created.id, owner.id, &changed).await.unwrap();
    assert_eq!(updated.calories, Some(350.0));
    assert_eq!(updated.notes.as_deref(), Some("with milk"));
    assert_eq!(updated.consumed_at, created.consumed_at);

    let err = diet::delete_entry(&pool, created.id, other.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    diet::delete_entry(&pool, created.id, owner.id).await.unwrap();
    assert!(matches!(
        diet::get_entry(&pool, created.id, owner.id).await,
        Err(ServiceError::NotFound(_))
    ));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn only_one_goal_is_active() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "planner").await;
    let targets = |kcal| GoalTargets {
        daily_calories: Some(kcal),
        ..Default::default()
    };

    let first = diet::create_goal(&pool, user.id, &targets(1800.0), true).await.unwrap();
    let second = diet::create_goal(&pool, user.id, &targets(2200.0), true).await.unwrap();
    let draft = diet::create_goal(&pool, user.id, &targets(2500.0), false).await.unwrap();

    let active = diet::active_goal(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(active.id, second.id);

    let reactivated = diet::activate_goal(&pool, first.id, user.id).await.unwrap();
    assert!(reactivated.is_active);
    let goals = diet::list_goals(&pool, user.id).await.unwrap();
    assert_eq!(goals.len(), 3);
    assert_eq!(goals.iter().filter(|g| g.is_active).count(), 1);

    // Activating someone else's goal fails and leaves the current one active.
    let stranger = seed_user(&pool, "stranger").await;
    let err = diet::activate_goal(&pool, draft.id, stranger.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let active = diet::active_goal(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(active.id, first.id);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn summary_without_goal_or_entries() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "new").await;

    let summary = diet::daily_summary(&pool, user.id, date(2024, 3, 1)).await.unwrap();
    assert_eq!(summary.totals.entries, 0);
    assert_eq!(summary.totals.calories, 0.0);
    assert!(summary.meals.is_empty());
    assert!(summary.goal.is_none());
    assert!(summary.remaining.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}
