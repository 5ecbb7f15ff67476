mod config;
mod plan_cmds;
mod resolve;
mod serve_cmd;
mod subscription_cmds;
#[cfg(test)]
mod test_util;
mod user_cmds;
mod workout_cmds;

use clap::{Parser, Subcommand};

use fitplan_db::pool;

use config::FitplanConfig;

#[derive(Parser)]
#[command(name = "fitplan", about = "Workout plans, schedules and diet diary")]
struct Cli {
    /// Database URL (overrides FITPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a fitplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/fitplan")]
        db_url: String,
        /// USDA FoodData Central API key
        #[arg(long)]
        usda_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the fitplan database (requires config file or env vars)
    DbInit,
    /// Serve the JSON API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// User accounts and access tokens
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Workout catalog
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Plan templates
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Plan subscriptions and their generated schedules
    Subscription {
        /// Act as this user (UUID, email or username)
        #[arg(long, global = true)]
        user: Option<String>,

        #[command(subcommand)]
        command: SubscriptionCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user and print an access token
    Add {
        email: String,
        username: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Issue a fresh access token for a user
    Token {
        /// UUID, email or username
        user: String,
    },
    /// List all users
    List,
    /// Delete a user and everything they own
    Delete {
        /// UUID, email or username
        user: String,
    },
}

#[derive(Subcommand)]
pub enum WorkoutCommands {
    /// Import workouts from a catalog TOML file
    Import {
        /// Path to the catalog file
        file: String,
        /// Record this user as the creator
        #[arg(long)]
        owner: Option<String>,
    },
    /// List workouts visible to everyone (or to --user)
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a plan from a TOML file
    Create {
        /// Path to the plan TOML file
        file: String,
        /// Record this user as the creator
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show plan details (or list all plans)
    Show {
        /// Plan ID or exported plan file (omit to list all)
        plan_id: Option<String>,
    },
    /// Export a plan from the database as TOML
    Export {
        /// Plan ID to export
        plan_id: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    /// Subscribe to a plan and generate its schedule
    Subscribe {
        /// Plan ID or exported plan file
        plan_id: String,
        /// First day of the plan (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,
    },
    /// Delete a subscription and its generated workouts
    Unsubscribe { subscription_id: String },
    /// Rebuild the generated workouts from the plan's current template
    Regenerate { subscription_id: String },
    /// Move a subscription to a new start date
    Reschedule {
        subscription_id: String,
        /// New first day (YYYY-MM-DD)
        #[arg(long)]
        start: String,
    },
    /// Set a subscription's status
    Status {
        subscription_id: String,
        /// active, paused, completed or cancelled
        status: String,
    },
    /// List the user's subscriptions
    List {
        #[arg(long)]
        status: Option<String>,
    },
}

/// Execute the `fitplan init` command: write config file.
fn cmd_init(db_url: &str, usda_key: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::new(db_url, usda_key);
    cfg.write(&path)?;
    let token_secret = &cfg.auth.token_secret;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  auth.token_secret = {}...{}", &token_secret[..8], &token_secret[56..]);
    if cfg.nutrition.api_key.is_none() {
        println!("  nutrition.api_key is unset; food search is disabled until FITPLAN_USDA_KEY is set");
    }
    println!();
    println!("Next: run `fitplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `fitplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = FitplanConfig::resolve(cli_db_url)?;

    println!("Initializing fitplan database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("fitplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            usda_key,
            force,
        } => {
            cmd_init(&db_url, usda_key, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = FitplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state = serve_cmd::AppState::from_config(db_pool.clone(), &resolved);
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::User { command } => {
            let resolved = FitplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                user_cmds::run_user_command(command, &db_pool, &resolved.token_config).await;
            db_pool.close().await;
            result?;
        }
        Commands::Workout { command } => {
            let resolved = FitplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = workout_cmds::run_workout_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = FitplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Subscription { user, command } => {
            let resolved = FitplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                subscription_cmds::run_subscription_command(command, user.as_deref(), &db_pool)
                    .await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
