use sea_orm_migration::prelude::*;

use crate::db::Patents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Patents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Patents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Patents::PatentNumber).string().null())
                    .col(ColumnDef::new(Patents::Title).text().null())
                    .col(ColumnDef::new(Patents::PublicationYear).integer().null())
                    .col(ColumnDef::new(Patents::Assignee).string().null())
                    .col(ColumnDef::new(Patents::FilingCreationDate).date().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patents_publication_year")
                    .table(Patents::Table)
                    .col(Patents::PublicationYear)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patents_assignee")
                    .table(Patents::Table)
                    .col(Patents::Assignee)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Patents::Table).to_owned())
            .await?;
        Ok(())
    }
}
