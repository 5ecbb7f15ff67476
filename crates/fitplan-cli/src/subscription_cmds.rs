//! `fitplan subscription` subcommands, acting as `--user`.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use fitplan_core::schedule;
use fitplan_db::models::{Subscription, SubscriptionStatus};

use crate::SubscriptionCommands;
use crate::resolve::{resolve_plan_id, resolve_user};

pub async fn run_subscription_command(
    command: SubscriptionCommands,
    user: Option<&str>,
    pool: &PgPool,
) -> Result<()> {
    let user = user.context("--user is required for subscription commands")?;
    let user_id = resolve_user(pool, user).await?.id;

    match command {
        SubscriptionCommands::Subscribe { plan_id, start } => {
            let plan_id = resolve_plan_id(&plan_id)?;
            let start = match start {
                Some(s) => parse_date(&s)?,
                None => Utc::now().date_naive(),
            };
            let sub = schedule::subscribe(pool, user_id, plan_id, start).await?;
            println!("Subscribed.");
            println!();
            print_subscription(&sub);
        }
        SubscriptionCommands::Unsubscribe { subscription_id } => {
            let id = parse_id(&subscription_id)?;
            schedule::unsubscribe(pool, id, user_id).await?;
            println!("Subscription {id} removed with its generated workouts.");
        }
        SubscriptionCommands::Regenerate { subscription_id } => {
            let id = parse_id(&subscription_id)?;
            let summary = schedule::regenerate(pool, id, user_id).await?;
            println!(
                "Regenerated subscription {id}: {} removed, {} generated.",
                summary.removed, summary.inserted
            );
        }
        SubscriptionCommands::Reschedule {
            subscription_id,
            start,
        } => {
            let id = parse_id(&subscription_id)?;
            let sub = schedule::reschedule(pool, id, user_id, parse_date(&start)?).await?;
            println!("Rescheduled.");
            println!();
            print_subscription(&sub);
        }
        SubscriptionCommands::Status {
            subscription_id,
            status,
        } => {
            let id = parse_id(&subscription_id)?;
            let status: SubscriptionStatus = status.parse()?;
            let sub = schedule::update_status(pool, id, user_id, status).await?;
            println!("Subscription {} is now {}.", sub.id, sub.status);
        }
        SubscriptionCommands::List { status } => {
            let status = status
                .as_deref()
                .map(str::parse::<SubscriptionStatus>)
                .transpose()?;
            let subs = schedule::list_subscriptions(pool, user_id, status).await?;
            if subs.is_empty() {
                println!("No subscriptions found.");
                return Ok(());
            }
            println!("{:<36}  {:<36}  {:<10}  {:<10}  END", "ID", "PLAN", "STATUS", "START");
            for s in &subs {
                println!(
                    "{:<36}  {:<36}  {:<10}  {:<10}  {}",
                    s.id, s.plan_id, s.status, s.start_date, s.end_date
                );
            }
        }
    }
    Ok(())
}

fn print_subscription(sub: &Subscription) {
    println!("  Subscription ID: {}", sub.id);
    println!("  Plan ID:         {}", sub.plan_id);
    println!("  Status:          {}", sub.status);
    println!("  Start:           {}", sub.start_date);
    println!("  End:             {}", sub.end_date);
}

fn parse_id(input: &str) -> Result<Uuid> {
    input
        .parse()
        .with_context(|| format!("invalid subscription ID: {input:?}"))
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid date {input:?}, expected YYYY-MM-DD"))
}
