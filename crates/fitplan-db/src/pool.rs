use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Schema migrations compiled in from `crates/fitplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables reported by [`table_counts`], in dependency order.
pub const TABLES: &[&str] = &[
    "users",
    "workouts",
    "plans",
    "plan_slots",
    "subscriptions",
    "scheduled_workouts",
    "food_entries",
    "nutrition_goals",
    "user_recent_foods",
];

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("migrations applied");
    Ok(())
}

/// Create the configured database on its server when it does not exist yet.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let Some(db_name) = config.database_name() else {
        bail!("no database name in {}", config.database_url);
    };
    // CREATE DATABASE takes no bind parameters.
    if !is_plain_identifier(db_name) {
        bail!("database name {db_name:?} contains invalid characters");
    }

    let maintenance_url = config.maintenance_url();
    let maint = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&maintenance_url)
        .await
        .with_context(|| format!("failed to connect to maintenance database at {maintenance_url}"))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint)
            .await
            .context("failed to query pg_database")?;

    if exists {
        debug!(db = db_name, "database already present");
    } else {
        maint
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = db_name, "database created");
    }

    maint.close().await;
    Ok(())
}

/// Row count per application table, for the `fitplan init` summary.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((*table, count));
    }
    Ok(counts)
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
