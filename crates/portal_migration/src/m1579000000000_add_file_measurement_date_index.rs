use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

const INDEX_NAME: &str = "idx_file_site_measurement_date";

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1579000000000_add_file_measurement_date_index")
        .up(
            Index::create()
                .name(INDEX_NAME)
                .table(File::Table)
                .col(File::SiteId)
                .col(File::MeasurementDate)
                .to_owned(),
        )
        .down(Index::drop().name(INDEX_NAME).table(File::Table).to_owned())
}

#[derive(DeriveIden)]
enum File {
    Table,
    SiteId,
    MeasurementDate,
}
