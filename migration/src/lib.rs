pub use sea_orm_migration::prelude::*;

mod m20250301_000000_create_settings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(
            m20250301_000000_create_settings_table::Migration,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};

    #[tokio::test]
    async fn up_creates_and_seeds_the_settings_row() -> Result<(), DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1);
        let db = Database::connect(opt).await?;

        Migrator::up(&db, None).await?;
        // Running twice must not fail or duplicate the seed row
        Migrator::up(&db, None).await?;

        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "SELECT json FROM settings WHERE id = 1",
            ))
            .await?
            .expect("seed row exists");
        let json: String = row.try_get("", "json")?;

        assert_eq!(json, "{}");
        Ok(())
    }
}
