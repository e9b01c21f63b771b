use config::{Config, StorageBackend};
use domain::{DatabaseBackend, FileBackend, MemoryBackend, SettingsBackend, SettingsStore};
use events::EventPublisher;
use log::info;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::time::Duration;

pub mod config;
pub mod logging;

pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    connect(config, config.database_url()).await
}

/// Opens a pool to `database_url` using the pool settings from `config`.
pub async fn connect(config: &Config, database_url: &str) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Database pool config: max_connections={}, min_connections={}, \
         connect_timeout={}s, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
        config.db_max_connections,
        config.db_min_connections,
        config.db_connect_timeout_secs,
        config.db_acquire_timeout_secs,
        config.db_idle_timeout_secs,
        config.db_max_lifetime_secs,
    );

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    Database::connect(opt).await
}

/// Builds the settings store for the configured backend. The database
/// backend is migrated before it is handed out.
pub async fn init_store(config: &Config) -> Result<SettingsStore, DbErr> {
    let backend: Arc<dyn SettingsBackend> = match config.storage_backend {
        StorageBackend::Database => {
            let db = init_database(config).await?;
            Migrator::up(&db, None).await?;
            info!("Settings stored in database [{}]", config.database_url());
            Arc::new(DatabaseBackend::new(db, config.database_url()))
        }
        StorageBackend::File => {
            info!(
                "Settings stored in file [{}]",
                config.admin_db_path().display()
            );
            Arc::new(FileBackend::new(config.admin_db_path().clone()))
        }
        StorageBackend::Memory => {
            info!("Settings stored in memory only");
            Arc::new(MemoryBackend::new())
        }
    };

    Ok(SettingsStore::new(backend))
}

// Service-level state shared by every request handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub settings_store: Arc<SettingsStore>,
    pub sse_manager: Arc<sse::Manager>,
    pub event_publisher: EventPublisher,
}

impl AppState {
    pub fn new(
        app_config: Config,
        settings_store: Arc<SettingsStore>,
        sse_manager: Arc<sse::Manager>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            config: app_config,
            settings_store,
            sse_manager,
            event_publisher,
        }
    }

    pub fn settings_store(&self) -> &SettingsStore {
        self.settings_store.as_ref()
    }
}
