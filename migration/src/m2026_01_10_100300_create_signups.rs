//! Migration to create the signups table.
//!
//! A volunteer holds at most one signup per shift; the (user_id, shift_id)
//! unique index enforces that regardless of how many legacy applications
//! referenced the same event.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Signups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Signups::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Signups::UserId).uuid().not_null())
                    .col(ColumnDef::new(Signups::ShiftId).uuid().not_null())
                    .col(ColumnDef::new(Signups::Status).text().not_null())
                    .col(
                        ColumnDef::new(Signups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Signups::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_signups_user_id")
                            .from(Signups::Table, Signups::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_signups_shift_id")
                            .from(Signups::Table, Signups::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_signups_user_shift")
                    .table(Signups::Table)
                    .col(Signups::UserId)
                    .col(Signups::ShiftId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_signups_shift_id")
                    .table(Signups::Table)
                    .col(Signups::ShiftId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_signups_user_shift").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_signups_shift_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Signups::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Signups {
    Table,
    Id,
    UserId,
    ShiftId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Shifts {
    Table,
    Id,
}
