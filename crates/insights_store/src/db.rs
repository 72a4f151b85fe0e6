use sea_orm_migration::prelude::DeriveIden;

#[derive(DeriveIden, Clone, Copy)]
pub enum Patents {
    Table,
    Id,
    PatentNumber,
    Title,
    PublicationYear,
    Assignee,
    FilingCreationDate,
}
