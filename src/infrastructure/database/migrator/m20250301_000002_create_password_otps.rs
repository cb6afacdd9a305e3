//! Migration to create password_otps table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PasswordOtps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PasswordOtps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PasswordOtps::UserId).integer().not_null())
                    .col(ColumnDef::new(PasswordOtps::Otp).string_len(6).not_null())
                    .col(
                        ColumnDef::new(PasswordOtps::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PasswordOtps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_otps_user")
                            .from(PasswordOtps::Table, PasswordOtps::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_password_otps_user_id")
                    .table(PasswordOtps::Table)
                    .col(PasswordOtps::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PasswordOtps::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PasswordOtps {
    Table,
    Id,
    UserId,
    Otp,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
