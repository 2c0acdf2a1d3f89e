use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1576059212000_create_file")
        .up(
            Table::create()
                .table(File::Table)
                .col(ColumnDef::new(File::Uuid).string_len(36).not_null().primary_key())
                .col(ColumnDef::new(File::SiteId).string().not_null())
                .col(ColumnDef::new(File::ProductId).string().not_null())
                .col(ColumnDef::new(File::InstrumentId).string().null())
                .col(ColumnDef::new(File::MeasurementDate).date().not_null())
                .col(ColumnDef::new(File::Filename).string().not_null())
                .col(ColumnDef::new(File::Hash).string_len(64).not_null())
                .col(ColumnDef::new(File::Size).big_integer().not_null())
                .col(ColumnDef::new(File::Format).string().not_null())
                .col(ColumnDef::new(File::Volatile).boolean().not_null().default(true))
                .col(ColumnDef::new(File::DownloadCount).integer().not_null().default(0))
                .col(
                    ColumnDef::new(File::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .col(
                    ColumnDef::new(File::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_file_site")
                        .from(File::Table, File::SiteId)
                        .to(Site::Table, Site::Id)
                        .on_delete(ForeignKeyAction::Restrict),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_file_product")
                        .from(File::Table, File::ProductId)
                        .to(Product::Table, Product::Id)
                        .on_delete(ForeignKeyAction::Restrict),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_file_instrument")
                        .from(File::Table, File::InstrumentId)
                        .to(Instrument::Table, Instrument::Id)
                        .on_delete(ForeignKeyAction::SetNull),
                )
                .to_owned(),
        )
        .down(Table::drop().table(File::Table).if_exists().to_owned())
}

#[derive(DeriveIden)]
enum File {
    Table,
    Uuid,
    SiteId,
    ProductId,
    InstrumentId,
    MeasurementDate,
    Filename,
    Hash,
    Size,
    Format,
    Volatile,
    DownloadCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Instrument {
    Table,
    Id,
}
