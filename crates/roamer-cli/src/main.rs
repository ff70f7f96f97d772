mod config;
mod sweep_cmd;

use clap::{Parser, Subcommand};

use roamer_db::pool;

use config::RoamerConfig;

#[derive(Parser)]
#[command(name = "roamer", about = "Maintenance for the roamer plan generation engine")]
struct Cli {
    /// Database URL (overrides ROAMER_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a roamer config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/roamer")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the roamer database and run migrations
    DbInit,
    /// Delete expired plan candidate sessions
    Sweep {
        /// Sweep once and exit
        #[arg(long)]
        once: bool,
        /// Seconds between sweeps when running continuously (default:
        /// planner.sweep_interval_secs from the config file)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

/// Execute the `roamer init` command: write the config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        planner: Some(roamer_core::config::PlannerConfig::default()),
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `roamer db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `roamer db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = RoamerConfig::resolve(cli_db_url)?;

    println!("Initializing roamer database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("roamer db-init complete.");
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
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Sweep {
            once,
            interval_secs,
        } => {
            let resolved = RoamerConfig::resolve(cli.database_url.as_deref())?;
            let interval_secs = interval_secs.unwrap_or(resolved.planner.sweep_interval_secs);
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = sweep_cmd::run_sweep(&db_pool, once, interval_secs).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that touch process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }
}
