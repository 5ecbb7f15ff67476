//! `fitplan user` subcommands. Accounts have no password: access to the
//! API is by the HMAC token printed here.

use anyhow::{Result, bail};
use sqlx::PgPool;

use fitplan_core::token::{TokenConfig, issue_token};
use fitplan_db::queries::users::{self, NewUser};

use crate::UserCommands;
use crate::resolve::resolve_user;

pub async fn run_user_command(
    command: UserCommands,
    pool: &PgPool,
    tokens: &TokenConfig,
) -> Result<()> {
    match command {
        UserCommands::Add {
            email,
            username,
            first_name,
            last_name,
        } => {
            cmd_add(
                pool,
                tokens,
                &email,
                &username,
                first_name.as_deref(),
                last_name.as_deref(),
            )
            .await
        }
        UserCommands::Token { user } => {
            let user = resolve_user(pool, &user).await?;
            println!("{}", issue_token(tokens, user.id));
            Ok(())
        }
        UserCommands::List => cmd_list(pool).await,
        UserCommands::Delete { user } => {
            let user = resolve_user(pool, &user).await?;
            users::delete_user(pool, user.id).await?;
            println!("User {} ({}) deleted.", user.username, user.id);
            Ok(())
        }
    }
}

async fn cmd_add(
    pool: &PgPool,
    tokens: &TokenConfig,
    email: &str,
    username: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<()> {
    if !email.contains('@') {
        bail!("invalid email address: {email:?}");
    }
    if username.trim().is_empty() {
        bail!("username must not be blank");
    }

    let user = users::insert_user(
        pool,
        &NewUser {
            email: email.trim(),
            username: username.trim(),
            first_name,
            last_name,
        },
    )
    .await?;

    println!("User created.");
    println!();
    println!("  User ID:  {}", user.id);
    println!("  Username: {}", user.username);
    println!("  Email:    {}", user.email);
    println!();
    println!("Access token (valid for {} hours):", tokens.ttl.as_secs() / 3600);
    println!("  {}", issue_token(tokens, user.id));

    Ok(())
}

async fn cmd_list(pool: &PgPool) -> Result<()> {
    let all = users::list_users(pool).await?;
    if all.is_empty() {
        println!("No users found. Use `fitplan user add <email> <username>` to create one.");
        return Ok(());
    }

    let name_w = all.iter().map(|u| u.username.len()).max().unwrap_or(8).max(8);
    println!("{:<36}  {:<name_w$}  EMAIL", "ID", "USERNAME");
    for u in &all {
        println!("{:<36}  {:<name_w$}  {}", u.id, u.username, u.email);
    }
    Ok(())
}
