//! Database query functions for the `users` table.

use anyhow::{Context, Result, bail};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::User;

/// Fields supplied when creating an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

pub async fn insert_user(db: impl PgExecutor<'_>, new: &NewUser<'_>) -> Result<User> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, username, first_name, last_name) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(new.email)
    .bind(new.username)
    .bind(new.first_name)
    .bind(new.last_name)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert user {:?}", new.username))
}

pub async fn get_user(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch user")
}

/// Look a user up by email or username, case-insensitively.
pub async fn find_user(db: impl PgExecutor<'_>, email_or_username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE lower(email) = lower($1) OR lower(username) = lower($1)",
    )
    .bind(email_or_username)
    .fetch_optional(db)
    .await
    .context("failed to look up user")
}

pub async fn list_users(db: impl PgExecutor<'_>) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
        .fetch_all(db)
        .await
        .context("failed to list users")
}

/// Delete a user. Subscriptions, scheduled workouts and diary rows cascade.
pub async fn delete_user(db: impl PgExecutor<'_>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete user")?;

    if result.rows_affected() == 0 {
        bail!("user {id} not found");
    }
    Ok(())
}
