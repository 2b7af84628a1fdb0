//! Migration to create the shifts table.
//!
//! Shifts imported from the legacy system carry their origin in
//! `legacy_event_id`; the unique index on that column is what makes re-runs
//! idempotent.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shifts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Shifts::ShiftTypeId).uuid().not_null())
                    .col(
                        ColumnDef::new(Shifts::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shifts::EndsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shifts::Capacity).integer().not_null())
                    .col(ColumnDef::new(Shifts::Location).text().null())
                    .col(ColumnDef::new(Shifts::Notes).text().null())
                    .col(ColumnDef::new(Shifts::LegacyEventId).big_integer().null())
                    .col(
                        ColumnDef::new(Shifts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Shifts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shifts_shift_type_id")
                            .from(Shifts::Table, Shifts::ShiftTypeId)
                            .to(ShiftTypes::Table, ShiftTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Partial unique index: NULL legacy_event_id rows (locally created
        // shifts) stay unconstrained.
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_shifts_legacy_event_id ON shifts (legacy_event_id) WHERE legacy_event_id IS NOT NULL".to_string(),
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shifts_starts_at")
                    .table(Shifts::Table)
                    .col(Shifts::StartsAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_shifts_legacy_event_id").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_shifts_starts_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Shifts {
    Table,
    Id,
    ShiftTypeId,
    StartsAt,
    EndsAt,
    Capacity,
    Location,
    Notes,
    LegacyEventId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ShiftTypes {
    Table,
    Id,
}
