use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InviteCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InviteCodes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InviteCodes::Code)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(InviteCodes::TelegramId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InviteCodes::CodeType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InviteCodes::IsUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(InviteCodes::UsedTime).big_integer())
                    .col(ColumnDef::new(InviteCodes::UsedUserId).big_integer())
                    .col(
                        ColumnDef::new(InviteCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(InviteCodes::Table, InviteCodes::TelegramId)
                            .to(Users::Table, Users::TelegramId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(InviteCodes::Table)
                    .col(InviteCodes::TelegramId)
                    .name("idx_invite_codes_telegram_id")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(InviteCodes::Table)
                    .col(InviteCodes::UsedUserId)
                    .name("idx_invite_codes_used_user_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InviteCodes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InviteCodes {
    Table,
    Id,
    Code,
    TelegramId,
    CodeType,
    IsUsed,
    UsedTime,
    UsedUserId,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    TelegramId,
}
