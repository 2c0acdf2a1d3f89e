use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1587000000000_create_download")
        .up(
            Table::create()
                .table(Download::Table)
                .col(
                    ColumnDef::new(Download::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Download::ObjectType).string_len(16).not_null())
                .col(ColumnDef::new(Download::ObjectUuid).string_len(36).not_null())
                .col(ColumnDef::new(Download::Ip).string().not_null())
                .col(ColumnDef::new(Download::Country).string_len(2).null())
                .col(
                    ColumnDef::new(Download::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .to_owned(),
        )
        .up(
            Index::create()
                .name("idx_download_created_at")
                .table(Download::Table)
                .col(Download::CreatedAt)
                .to_owned(),
        )
        .down(Table::drop().table(Download::Table).if_exists().to_owned())
}

#[derive(DeriveIden)]
enum Download {
    Table,
    Id,
    ObjectType,
    ObjectUuid,
    Ip,
    Country,
    CreatedAt,
}
