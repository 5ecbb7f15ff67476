//! CLI handlers for `fitplan plan` subcommands.
//!
//! - `fitplan plan create <file>`  -- create a plan from a TOML file
//! - `fitplan plan show [plan-id]` -- show plan details or list all plans
//! - `fitplan plan export <id>`    -- write a plan back out as TOML

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use fitplan_core::plan::{create_plan_from_toml, export_plan_toml, get_plan_with_slots, parse_plan_toml};
use fitplan_db::queries::{plans as plan_queries, workouts};

use crate::PlanCommands;
use crate::resolve::{resolve_plan_id, resolve_user};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub async fn run_plan_command(command: PlanCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::Create { file, owner } => cmd_create(pool, &file, owner.as_deref()).await,
        PlanCommands::Show { plan_id } => match plan_id {
            Some(id) => cmd_show_one(pool, &id).await,
            None => cmd_show_all(pool).await,
        },
        PlanCommands::Export { plan_id, output } => {
            cmd_export(pool, &plan_id, output.as_deref()).await
        }
    }
}

// -----------------------------------------------------------------------
// fitplan plan create <file>
// -----------------------------------------------------------------------

async fn cmd_create(pool: &PgPool, file_path: &str, owner: Option<&str>) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read plan file: {file_path}"))?;
    let plan_toml = parse_plan_toml(&content)
        .with_context(|| format!("failed to parse plan file: {file_path}"))?;

    let owner = match owner {
        Some(o) => Some(resolve_user(pool, o).await?.id),
        None => None,
    };
    let (plan, slots) = create_plan_from_toml(pool, &plan_toml, owner).await?;

    println!("Plan created successfully.");
    println!();
    println!("  Plan ID:   {}", plan.id);
    println!("  Name:      {}", plan.name);
    println!("  Weeks:     {}", plan.duration_weeks);
    println!("  Slots:     {}", slots.len());
    println!("  Public:    {}", plan.is_public);

    Ok(())
}

// -----------------------------------------------------------------------
// fitplan plan show
// -----------------------------------------------------------------------

async fn cmd_show_all(pool: &PgPool) -> Result<()> {
    let plans = plan_queries::list_plans(pool, None).await?;

    if plans.is_empty() {
        println!("No plans found. Use `fitplan plan create <file>` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let name_w = plans.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    let weeks_w = 5;

    println!("{:<id_w$}  {:<name_w$}  {:>weeks_w$}  CREATED", "ID", "NAME", "WEEKS");
    for plan in &plans {
        println!(
            "{:<id_w$}  {:<name_w$}  {:>weeks_w$}  {}",
            plan.id,
            plan.name,
            plan.duration_weeks,
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

async fn cmd_show_one(pool: &PgPool, plan_ref: &str) -> Result<()> {
    let plan_id = resolve_plan_id(plan_ref)?;
    let (plan, slots) = get_plan_with_slots(pool, plan_id).await?;

    let ids: Vec<Uuid> = slots.iter().map(|s| s.workout_id).collect();
    let names: HashMap<Uuid, String> = workouts::get_workouts_by_ids(pool, &ids)
        .await?
        .into_iter()
        .map(|w| (w.id, w.name))
        .collect();

    println!("Plan: {}", plan.name);
    println!("  ID:       {}", plan.id);
    println!("  Weeks:    {}", plan.duration_weeks);
    println!("  Public:   {}", plan.is_public);
    println!("  Created:  {}", plan.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(desc) = plan.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("  About:    {}", desc.trim());
    }
    println!("  Slots:    {}", slots.len());

    let mut week = None;
    for slot in &slots {
        if week != Some(slot.week_offset) {
            week = Some(slot.week_offset);
            println!();
            println!("  Week {}", slot.week_offset + 1);
        }
        let day = usize::try_from(slot.week_day)
            .ok()
            .and_then(|d| WEEKDAYS.get(d))
            .copied()
            .unwrap_or("?");
        let name = names
            .get(&slot.workout_id)
            .map(String::as_str)
            .unwrap_or("(deleted workout)");
        let marker = if slot.data_override.is_some() { " *" } else { "" };
        println!("    {day}  {name}{marker}");
    }
    if slots.iter().any(|s| s.data_override.is_some()) {
        println!();
        println!("  * parameters overridden for this slot");
    }

    Ok(())
}

// -----------------------------------------------------------------------
// fitplan plan export <plan-id> [--output <file>]
// -----------------------------------------------------------------------

async fn cmd_export(pool: &PgPool, plan_ref: &str, output: Option<&str>) -> Result<()> {
    let plan_id = resolve_plan_id(plan_ref)?;
    let toml_content = export_plan_toml(pool, plan_id).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &toml_content)
                .with_context(|| format!("failed to write to {path}"))?;
            println!("Plan exported to {path}");
        }
        None => print!("{toml_content}"),
    }

    Ok(())
}
