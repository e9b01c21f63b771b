use clap::Parser;
use domain::{settings as SettingsApi, DatabaseBackend, SettingsStore};
use log::*;
use service::{
    config::{Config, StorageBackend},
    logging::Logger,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Copies the settings document from a local SQLite database into the
/// database named by `DATABASE_URL`, migrating the target first.
#[derive(Parser)]
#[command(about, long_about = None)]
struct Args {
    /// Path to the source SQLite database
    #[arg(long, default_value = "./admin.db")]
    source: PathBuf,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let Args { source, mut config } = Args::parse();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start the logger: {e}");
    }

    if !config.has_database_url() {
        error!("A target is required: set DATABASE_URL or pass --database-url");
        std::process::exit(2);
    }
    if !source.exists() {
        error!("Source database {} does not exist", source.display());
        std::process::exit(2);
    }

    let source_url = format!("sqlite://{}?mode=ro", source.display());
    info!("Reading settings from SQLite [{}]", source.display());

    let source_db = match service::connect(&config, &source_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open the source database: {e}");
            std::process::exit(1);
        }
    };
    let source_store = SettingsStore::new(Arc::new(DatabaseBackend::new(source_db, &source_url)));

    let settings = match SettingsApi::find(&source_store).await {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to read the source settings: {e}");
            std::process::exit(1);
        }
    };
    info!("Payload: {settings:?}");

    info!("Writing settings to target [{}]", config.database_url());
    config.storage_backend = StorageBackend::Database;
    let target_store = match service::init_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open the target database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = SettingsApi::replace(&target_store, &settings).await {
        error!("Failed to write the target settings: {e}");
        std::process::exit(1);
    }

    info!("Migration completed.");
}
