use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use trivia_api::config::Config;
use trivia_api::db::SqliteStorage;
use trivia_api::storage::Storage;
use trivia_api::{logging, seed, server};

#[derive(Parser)]
#[command(name = "trivia_api")]
#[command(about = "Trivia game HTTP API: categories, questions, and quiz play")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config and the PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply database migrations and exit
    Migrate,
    /// Load categories and questions from a JSON seed file
    Seed {
        /// Path to the seed file
        #[arg(long)]
        file: String,
    },
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let storage = SqliteStorage::open(&config.database.path)?;
    storage.run_migrations()?;
    Ok(storage)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve { port } => {
            let storage: Arc<dyn Storage> = Arc::new(open_storage(&config)?);
            let port = port.unwrap_or(config.server.port);
            server::start_server(storage, port).await?;
        }
        Commands::Migrate => {
            open_storage(&config)?;
            info!("Migrations applied to {}", config.database.path);
            println!("✅ Migrations applied to {}", config.database.path);
        }
        Commands::Seed { file } => {
            let storage = open_storage(&config)?;
            let summary = seed::seed_from_file(&storage, &file).await?;
            println!(
                "✅ Seeded {} categories and {} questions into {}",
                summary.categories, summary.questions, config.database.path
            );
        }
    }
    Ok(())
}
