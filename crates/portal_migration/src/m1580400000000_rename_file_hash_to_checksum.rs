use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1580400000000_rename_file_hash_to_checksum")
        .up(
            Table::alter()
                .table(File::Table)
                .rename_column(File::Hash, File::Checksum)
                .to_owned(),
        )
        .down(
            Table::alter()
                .table(File::Table)
                .rename_column(File::Checksum, File::Hash)
                .to_owned(),
        )
}

#[derive(DeriveIden)]
enum File {
    Table,
    Hash,
    Checksum,
}
