use super::{Diagnostics, SettingsBackend};
use crate::error::Error;
use async_trait::async_trait;
use entity::settings::{ActiveModel, Column, Entity};
use entity::SETTINGS_ROW_ID;
use log::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait};

/// Stores the document in row `id = 1` of the `settings` table of any
/// database sea-orm can reach (PostgreSQL, SQLite).
pub struct DatabaseBackend {
    db: DatabaseConnection,
    database: Option<String>,
    host: Option<String>,
}

impl DatabaseBackend {
    /// `database_url` is only used to describe the connection in diagnostics.
    pub fn new(db: DatabaseConnection, database_url: &str) -> Self {
        let (database, host) = describe_url(database_url);
        Self { db, database, host }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn driver(&self) -> &'static str {
        match self.db.get_database_backend() {
            DbBackend::Postgres => "postgresql",
            DbBackend::Sqlite => "sqlite",
            DbBackend::MySql => "mysql",
        }
    }
}

#[async_trait]
impl SettingsBackend for DatabaseBackend {
    async fn read_raw(&self) -> Result<Option<String>, Error> {
        let row = Entity::find_by_id(SETTINGS_ROW_ID).one(&self.db).await?;
        Ok(row.map(|row| row.json))
    }

    async fn write_raw(&self, json: String) -> Result<(), Error> {
        let row = ActiveModel {
            id: Set(SETTINGS_ROW_ID),
            json: Set(json),
        };

        // Single upsert statement: the row is either fully replaced or untouched
        Entity::insert(row)
            .on_conflict(
                OnConflict::column(Column::Id)
                    .update_column(Column::Json)
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        trace!("Upserted settings row {SETTINGS_ROW_ID}");
        Ok(())
    }

    async fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.driver(), self.database.clone(), self.host.clone())
            .with_probe(self.db.ping().await)
    }
}

/// Extracts the database name and host from a connection URL without ever
/// exposing credentials.
fn describe_url(database_url: &str) -> (Option<String>, Option<String>) {
    if let Some(rest) = database_url.strip_prefix("sqlite:") {
        let path = rest.trim_start_matches("//");
        let path = path.split('?').next().unwrap_or_default();
        return (Some(path.to_string()).filter(|p| !p.is_empty()), None);
    }

    match url::Url::parse(database_url) {
        Ok(url) => {
            let database = url.path().trim_start_matches('/');
            (
                Some(database.to_string()).filter(|d| !d.is_empty()),
                url.host_str().map(str::to_string),
            )
        }
        Err(e) => {
            warn!("Unable to parse database URL for diagnostics: {e}");
            (None, None)
        }
    }
}
