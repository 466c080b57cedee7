use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Account::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Account::Username)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Account::Email).string_len(255).null().unique_key())
                    .col(ColumnDef::new(Account::PasswordHash).string().null())
                    .col(
                        ColumnDef::new(Account::AccountType)
                            .string_len(16)
                            .not_null()
                            .default("guest"),
                    )
                    .col(ColumnDef::new(Account::GuestUuid).string_len(64).null().unique_key())
                    .col(
                        ColumnDef::new(Account::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Account::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Account::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 按类型筛选账户（清理、统计）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_accounts_account_type")
                    .table(Account::Table)
                    .col(Account::AccountType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_accounts_account_type").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Account {
    #[sea_orm(iden = "accounts")]
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    AccountType,
    GuestUuid,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
