//! Ad-hoc workout logging and record edits against a real database.

use fitplan_core::ServiceError;
use fitplan_core::workout_log::{self, PerformedValues, ScheduledUpdate};
use fitplan_db::models::{CompletionState, StrengthData, WorkoutData};
use fitplan_db::queries::scheduled_workouts::ScheduledFilter;
use fitplan_db::queries::workouts::{self, NewWorkout};
use fitplan_test_utils::{create_test_db, date, drop_test_db, seed_user, seed_workout};

#[tokio::test]
async fn logged_workout_has_snapshot_and_no_back_references() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "runner").await;
    let squat = seed_workout(&pool, "Squat").await;

    let record = workout_log::log_workout(
        &pool,
        user.id,
        squat.id,
        date(2024, 5, 6),
        Some("felt heavy".into()),
    )
    .await
    .unwrap();

    assert_eq!(record.completed_workout_data.name, "Squat");
    assert_eq!(record.completed_workout_data.workout_data, squat.workout_data.0);
    assert_eq!(record.completion_state, CompletionState::Pending);
    assert_eq!(record.notes.as_deref(), Some("felt heavy"));
    assert!(record.subscription_id.is_none());
    assert!(record.plan_id.is_none());
    assert!(record.slot_id.is_none());

    // The same workout twice on one day is allowed for ad-hoc entries.
    workout_log::log_workout(&pool, user.id, squat.id, date(2024, 5, 6), None)
        .await
        .unwrap();
    let stats = workout_log::workout_stats(&pool, user.id, date(2024, 1, 1))
        .await
        .unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.distinct_days, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn logging_a_missing_workout_is_not_found() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "runner").await;

    let err = workout_log::log_workout(&pool, user.id, uuid::Uuid::new_v4(), date(2024, 5, 6), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn private_workout_can_only_be_logged_by_its_creator() {
    let (pool, db_name) = create_test_db().await;
    let owner = seed_user(&pool, "coach").await;
    let stranger = seed_user(&pool, "stranger").await;
    let data = WorkoutData::Strength(StrengthData {
        sets: Some(6),
        ..Default::default()
    });
    let secret = workouts::insert_workout(
        &pool,
        &NewWorkout {
            name: "Coach's complex",
            category: "strength",
            equipment: None,
            description: None,
            instructions: Some("Do not share."),
            workout_data: &data,
            created_by: Some(owner.id),
            is_public: false,
        },
    )
    .await
    .unwrap();

    let err = workout_log::log_workout(&pool, stranger.id, secret.id, date(2024, 5, 6), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
    let stats = workout_log::workout_stats(&pool, stranger.id, date(2024, 1, 1))
        .await
        .unwrap();
    assert_eq!(stats.total, 0);

    let own = workout_log::log_workout(&pool, owner.id, secret.id, date(2024, 5, 6), None)
        .await
        .unwrap();
    assert_eq!(own.completed_workout_data.name, "Coach's complex");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_merges_and_snapshot_survives_workout_delete() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "lifter").await;
    let squat = seed_workout(&pool, "Squat").await;
    let record = workout_log::log_workout(&pool, user.id, squat.id, date(2024, 5, 6), Some("a".into()))
        .await
        .unwrap();

    let first = workout_log::update_scheduled(
        &pool,
        record.id,
        user.id,
        &ScheduledUpdate {
            performed: PerformedValues {
                sets: Some(3),
                reps: Some(5),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(first.notes.as_deref(), Some("a"));
    assert_eq!(first.completion_state, CompletionState::Pending);

    let second = workout_log::update_scheduled(
        &pool,
        record.id,
        user.id,
        &ScheduledUpdate {
            completion_state: Some(CompletionState::Complete),
            performed: PerformedValues {
                weight_kg: Some(100.0),
                ..Default::default()
            },
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let data = &second.completed_workout_data.0;
    assert_eq!(second.completion_state, CompletionState::Complete);
    assert_eq!(data.performed_sets, Some(3));
    assert_eq!(data.performed_reps, Some(5));
    assert_eq!(data.performed_weight_kg, Some(100.0));

    workouts::delete_workout(&pool, squat.id).await.unwrap();
    let kept = workout_log::get_scheduled(&pool, record.id, user.id).await.unwrap();
    assert_eq!(kept.completed_workout_data.name, "Squat");

    let stats = workout_log::workout_stats(&pool, user.id, date(2024, 1, 1))
        .await
        .unwrap();
    assert_eq!(stats.completed, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn other_users_cannot_see_or_touch_records() {
    let (pool, db_name) = create_test_db().await;
    let owner = seed_user(&pool, "owner").await;
    let other = seed_user(&pool, "other").await;
    let squat = seed_workout(&pool, "Squat").await;
    let record = workout_log::log_workout(&pool, owner.id, squat.id, date(2024, 5, 6), None)
        .await
        .unwrap();

    let err = workout_log::get_scheduled(&pool, record.id, other.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = workout_log::update_scheduled(&pool, record.id, other.id, &ScheduledUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = workout_log::delete_scheduled(&pool, record.id, other.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let listed = workout_log::list_scheduled(&pool, &ScheduledFilter::for_user(other.id))
        .await
        .unwrap();
    assert!(listed.is_empty());

    workout_log::delete_scheduled(&pool, record.id, owner.id).await.unwrap();

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_rejects_reversed_window() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "runner").await;

    let filter = ScheduledFilter {
        from: Some(date(2024, 6, 1)),
        to: Some(date(2024, 5, 1)),
        ..ScheduledFilter::for_user(user.id)
    };
    let err = workout_log::list_scheduled(&pool, &filter).await.unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}
