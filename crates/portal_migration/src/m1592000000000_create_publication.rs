use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1592000000000_create_publication")
        .up(
            Table::create()
                .table(Publication::Table)
                .col(
                    ColumnDef::new(Publication::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Publication::Pid).string().not_null())
                .col(ColumnDef::new(Publication::Citation).text().not_null())
                .col(ColumnDef::new(Publication::Year).integer().not_null())
                .col(
                    ColumnDef::new(Publication::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .to_owned(),
        )
        .up(
            Index::create()
                .name("idx_publication_pid")
                .table(Publication::Table)
                .col(Publication::Pid)
                .unique()
                .to_owned(),
        )
        .down(Table::drop().table(Publication::Table).if_exists().to_owned())
}

#[derive(DeriveIden)]
enum Publication {
    Table,
    Id,
    Pid,
    Citation,
    Year,
    UpdatedAt,
}
