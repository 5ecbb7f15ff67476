//! Test support for fitplan integration tests.
//!
//! A single PostgreSQL server is shared per test binary; every test gets a
//! fresh database in it with migrations applied. Set `FITPLAN_TEST_PG_URL`
//! (server root, no database name) to reuse an already running server
//! instead of starting a container.
//!
//! The `seed_*` helpers insert minimal valid rows so tests can focus on the
//! behaviour under test.

use std::time::Duration;

use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use fitplan_db::models::{Plan, StrengthData, User, Workout, WorkoutData};
use fitplan_db::pool;
use fitplan_db::queries::plan_slots::{self, NewPlanSlot};
use fitplan_db::queries::plans::{self, NewPlan};
use fitplan_db::queries::users::{self, NewUser};
use fitplan_db::queries::workouts::{self, NewWorkout};

struct SharedServer {
    base_url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<SharedServer> = OnceCell::const_new();

async fn start_server() -> SharedServer {
    if let Ok(url) = std::env::var("FITPLAN_TEST_PG_URL") {
        return SharedServer {
            base_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("17")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");

    SharedServer {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Server root URL, starting the shared server on first use.
pub async fn pg_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.base_url
}

async fn maintenance_pool() -> PgPool {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&format!("{}/postgres", pg_url().await))
        .await
        .expect("failed to connect to maintenance database")
}

/// Create a uniquely named, migrated database. Returns `(pool, db_name)`;
/// pass `db_name` to [`drop_test_db`] at the end of the test.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("fitplan_test_{}", Uuid::new_v4().simple());

    let maint = maintenance_pool().await;
    maint
        .execute(format!("CREATE DATABASE {db_name}").as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create {db_name}: {e}"));
    maint.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&format!("{}/{db_name}", pg_url().await))
        .await
        .unwrap_or_else(|e| panic!("failed to connect to {db_name}: {e}"));

    pool::run_migrations(&pool)
        .await
        .expect("migrations should apply to a fresh database");

    (pool, db_name)
}

/// Drop a database made by [`create_test_db`], kicking any stragglers.
pub async fn drop_test_db(db_name: &str) {
    let maint = maintenance_pool().await;
    let _ = maint
        .execute(
            format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                 WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
            )
            .as_str(),
        )
        .await;
    let _ = maint
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maint.close().await;
}

pub async fn seed_user(pool: &PgPool, username: &str) -> User {
    let email = format!("{username}@example.test");
    users::insert_user(
        pool,
        &NewUser {
            email: &email,
            username,
            first_name: None,
            last_name: None,
        },
    )
    .await
    .expect("seed user")
}

/// A public strength workout with three sets of ten.
pub async fn seed_workout(pool: &PgPool, name: &str) -> Workout {
    let data = WorkoutData::Strength(StrengthData {
        sets: Some(3),
        reps: Some(10),
        weight_kg: None,
        rest_seconds: Some(90),
    });
    workouts::insert_workout(
        pool,
        &NewWorkout {
            name,
            category: "strength",
            equipment: Some("barbell"),
            description: Some("seeded for tests"),
            instructions: None,
            workout_data: &data,
            created_by: None,
            is_public: true,
        },
    )
    .await
    .expect("seed workout")
}

/// A public plan with one slot per `(workout_id, week_offset, week_day)`.
pub async fn seed_plan(pool: &PgPool, duration_weeks: i32, slots: &[(Uuid, i32, i32)]) -> Plan {
    let plan = plans::insert_plan(
        pool,
        &NewPlan {
            name: "seeded plan",
            description: None,
            duration_weeks,
            created_by: None,
            is_public: true,
        },
    )
    .await
    .expect("seed plan");

    let new_slots: Vec<NewPlanSlot> = slots
        .iter()
        .enumerate()
        .map(|(i, &(workout_id, week_offset, week_day))| NewPlanSlot {
            workout_id,
            week_offset,
            week_day,
            slot_order: i as i32,
            data_override: None,
        })
        .collect();
    plan_slots::insert_slots(pool, plan.id, &new_slots)
        .await
        .expect("seed plan slots");

    plan
}

/// Shorthand for `NaiveDate::from_ymd_opt(..).unwrap()` in test bodies.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
}
