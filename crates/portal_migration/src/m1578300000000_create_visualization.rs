use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1578300000000_create_visualization")
        .up(
            Table::create()
                .table(Visualization::Table)
                .col(ColumnDef::new(Visualization::S3key).string().not_null().primary_key())
                .col(ColumnDef::new(Visualization::SourceFileUuid).string_len(36).not_null())
                .col(ColumnDef::new(Visualization::VariableId).string().not_null())
                .col(
                    ColumnDef::new(Visualization::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_visualization_file")
                        .from(Visualization::Table, Visualization::SourceFileUuid)
                        .to(File::Table, File::Uuid)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        // 1600000000000_drop_visualization 跳过回退后表已不存在
        .down(Table::drop().table(Visualization::Table).if_exists().to_owned())
}

#[derive(DeriveIden)]
enum Visualization {
    Table,
    S3key,
    SourceFileUuid,
    VariableId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum File {
    Table,
    Uuid,
}
