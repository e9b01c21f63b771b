use clap::builder::TypedValueParser as _;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Connection string used when `DATABASE_URL` is not set: an SQLite file in
/// the working directory, created on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://admin.db?mode=rwc";

/// Origin value that allows every origin (and disables credentialed CORS).
pub const ANY_ORIGIN: &str = "*";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// Where the settings document is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// A `settings` table reached through `DATABASE_URL` (SQLite or PostgreSQL).
    Database,
    /// A JSON file at `ADMIN_DB_PATH`.
    File,
    /// Process memory only; lost on restart.
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageBackend::Database => write!(f, "database"),
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of CORS origins allowed to receive server responses, or `*` for any origin.
    #[arg(
        long,
        env = "GRID_ALLOWED_ORIGIN",
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = ANY_ORIGIN
    )]
    pub allowed_origins: Vec<String>,

    /// Shared token required on every settings endpoint. Leave unset to disable the check.
    #[arg(long, env)]
    admin_api_token: Option<String>,

    /// Where the settings document is stored.
    #[arg(long, env, value_enum, default_value_t = StorageBackend::Database)]
    pub storage_backend: StorageBackend,

    /// Sets the database URL to connect to (PostgreSQL or SQLite)
    #[arg(short, long, env)]
    database_url: Option<String>,

    /// Path of the JSON document used by the `file` storage backend
    #[arg(long, env, default_value = "./admin-settings.json")]
    admin_db_path: PathBuf,

    /// Maximum number of database connections in the pool
    #[arg(long, env, default_value_t = 10)]
    pub db_max_connections: u32,

    /// Minimum number of idle database connections to maintain
    #[arg(long, env, default_value_t = 1)]
    pub db_min_connections: u32,

    /// Timeout in seconds for establishing a new database connection
    #[arg(long, env, default_value_t = 8)]
    pub db_connect_timeout_secs: u64,

    /// Timeout in seconds for acquiring a connection from the pool
    #[arg(long, env, default_value_t = 8)]
    pub db_acquire_timeout_secs: u64,

    /// Seconds before an idle connection is closed
    #[arg(long, env, default_value_t = 600)]
    pub db_idle_timeout_secs: u64,

    /// Maximum lifetime in seconds for any connection in the pool
    #[arg(long, env, default_value_t = 1800)]
    pub db_max_lifetime_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 5000)]
    pub port: u16,

    /// Number of messages queued for one stream subscriber before it is dropped as stalled
    #[arg(long, env, default_value_t = 64)]
    pub subscriber_queue_capacity: usize,

    /// Seconds between keep-alive comments on idle settings streams
    #[arg(long, env, default_value_t = 15)]
    pub sse_keep_alive_secs: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap_or(LevelFilter::Info)),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap_or(RustEnv::Development)),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn set_database_url(mut self, database_url: String) -> Self {
        self.database_url = Some(database_url);
        self
    }

    /// The configured database URL, falling back to the embedded SQLite file.
    pub fn database_url(&self) -> &str {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_DATABASE_URL)
    }

    /// Whether `DATABASE_URL` was given explicitly.
    pub fn has_database_url(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    pub fn admin_db_path(&self) -> &PathBuf {
        &self.admin_db_path
    }

    /// The admin token, or `None` when auth is disabled (unset or blank).
    pub fn admin_api_token(&self) -> Option<&str> {
        self.admin_api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn set_admin_api_token(mut self, token: Option<String>) -> Self {
        self.admin_api_token = token;
        self
    }

    /// True when any origin may call the API, either by `*` or by an empty list.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins
            .iter()
            .all(|origin| origin.trim().is_empty())
            || self
                .allowed_origins
                .iter()
                .any(|origin| origin.trim() == ANY_ORIGIN)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}
