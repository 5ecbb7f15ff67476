//! `fitplan workout` subcommands.

use std::path::Path;

use anyhow::Result;
use sqlx::PgPool;

use fitplan_core::workout::{import_catalog, load_catalog_file};
use fitplan_db::queries::workouts;

use crate::WorkoutCommands;
use crate::resolve::resolve_user;

pub async fn run_workout_command(command: WorkoutCommands, pool: &PgPool) -> Result<()> {
    match command {
        WorkoutCommands::Import { file, owner } => {
            let catalog = load_catalog_file(Path::new(&file))?;
            let owner = match owner {
                Some(o) => Some(resolve_user(pool, &o).await?.id),
                None => None,
            };
            let inserted = import_catalog(pool, &catalog, owner).await?;
            println!("Imported {} workout(s) from {file}.", inserted.len());
            for w in &inserted {
                println!("  {}  {} ({})", w.id, w.name, w.workout_data.kind());
            }
            Ok(())
        }
        WorkoutCommands::List { category, user } => {
            let viewer = match user {
                Some(u) => Some(resolve_user(pool, &u).await?.id),
                None => None,
            };
            let rows = workouts::list_workouts(pool, viewer, category.as_deref()).await?;
            if rows.is_empty() {
                println!("No workouts found. Use `fitplan workout import <file>` to add some.");
                return Ok(());
            }

            let name_w = rows.iter().map(|w| w.name.len()).max().unwrap_or(4).max(4);
            let cat_w = rows.iter().map(|w| w.category.len()).max().unwrap_or(8).max(8);
            println!("{:<36}  {:<name_w$}  {:<cat_w$}  TYPE", "ID", "NAME", "CATEGORY");
            for w in &rows {
                println!(
                    "{:<36}  {:<name_w$}  {:<cat_w$}  {}",
                    w.id,
                    w.name,
                    w.category,
                    w.workout_data.kind()
                );
            }
            Ok(())
        }
    }
}
