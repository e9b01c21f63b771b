use entity::SETTINGS_ROW_ID;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settings::Json).text().not_null())
                    .to_owned(),
            )
            .await?;

        // Seed the single settings row with an empty document
        let seed = Query::insert()
            .into_table(Settings::Table)
            .columns([Settings::Id, Settings::Json])
            .values_panic([SETTINGS_ROW_ID.into(), "{}".into()])
            .on_conflict(OnConflict::column(Settings::Id).do_nothing().to_owned())
            .to_owned();

        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Id,
    Json,
}
