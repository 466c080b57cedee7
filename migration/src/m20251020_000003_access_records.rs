use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessRecord::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessRecord::LinkId).big_integer().not_null())
                    .col(
                        ColumnDef::new(AccessRecord::AccountEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessRecord::AccountType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccessRecord::AccessedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_access_records_link_id")
                            .from(AccessRecord::Table, AccessRecord::LinkId)
                            .to(ShortLink::Table, ShortLink::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接访问历史（按时间排序）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_access_records_link_time")
                    .table(AccessRecord::Table)
                    .col(AccessRecord::LinkId)
                    .col(AccessRecord::AccessedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_access_records_link_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AccessRecord::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AccessRecord {
    #[sea_orm(iden = "access_records")]
    Table,
    Id,
    LinkId,
    AccountEmail,
    AccountType,
    AccessedAt,
}

#[derive(DeriveIden)]
enum ShortLink {
    #[sea_orm(iden = "short_links")]
    Table,
    Id,
}
