use clap::{Parser, Subcommand};
use ota_core::Environment;
use tracing_subscriber::EnvFilter;

mod collect;
mod inspect;

#[derive(Debug, Parser)]
#[command(name = "ota-cli")]
#[command(about = "Trending-context collection command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run one collection attempt against the provider
    Collect,
    /// List recent collection runs
    Runs {
        /// Number of runs to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show the items of a collection run
    Items {
        /// Run id; defaults to the latest successful run
        #[arg(long)]
        run: Option<uuid::Uuid>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("ota-cli: no command given; see --help");
        return Ok(());
    };

    let config = ota_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, model = %config.openai_model, "configuration loaded");

    let pool_config = ota_db::PoolConfig::from_app_config(&config);
    let pool = ota_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            ota_db::ping(&pool).await?;
            println!("database reachable");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            ota_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        Commands::Collect => {
            if migrates_before_collect(&config.env) {
                ota_db::run_migrations(&pool).await?;
            }
            collect::run_collect(pool, &config).await?;
        }
        Commands::Runs { limit } => inspect::list_runs(&pool, limit).await?,
        Commands::Items { run } => inspect::show_items(&pool, run).await?,
    }

    Ok(())
}

/// Outside production `collect` applies pending migrations itself; in
/// production the schema only moves through `db migrate`.
fn migrates_before_collect(env: &Environment) -> bool {
    !matches!(env, Environment::Production)
}
