use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1575985412000_initial_schema")
        // 站点、仪器与产品是其余各表引用的参考数据
        .up(
            Table::create()
                .table(Site::Table)
                .col(ColumnDef::new(Site::Id).string().not_null().primary_key())
                .col(ColumnDef::new(Site::HumanReadableName).string().not_null())
                .col(ColumnDef::new(Site::SiteType).string().not_null())
                .col(ColumnDef::new(Site::Latitude).double().not_null())
                .col(ColumnDef::new(Site::Longitude).double().not_null())
                .col(ColumnDef::new(Site::Altitude).integer().not_null())
                .to_owned(),
        )
        .up(
            Table::create()
                .table(Instrument::Table)
                .col(ColumnDef::new(Instrument::Id).string().not_null().primary_key())
                .col(ColumnDef::new(Instrument::HumanReadableName).string().not_null())
                .col(ColumnDef::new(Instrument::InstrumentType).string().not_null())
                .to_owned(),
        )
        .up(
            Table::create()
                .table(Product::Table)
                .col(ColumnDef::new(Product::Id).string().not_null().primary_key())
                .col(ColumnDef::new(Product::HumanReadableName).string().not_null())
                .to_owned(),
        )
        .down(Table::drop().table(Product::Table).if_exists().to_owned())
        .down(Table::drop().table(Instrument::Table).if_exists().to_owned())
        .down(Table::drop().table(Site::Table).if_exists().to_owned())
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Id,
    HumanReadableName,
    SiteType,
    Latitude,
    Longitude,
    Altitude,
}

#[derive(DeriveIden)]
enum Instrument {
    Table,
    Id,
    HumanReadableName,
    InstrumentType,
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    HumanReadableName,
}
