use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1577270000000_add_site_country")
        .up(
            Table::alter()
                .table(Site::Table)
                .add_column(ColumnDef::new(Site::Country).string().null())
                .to_owned(),
        )
        .down(Table::alter().table(Site::Table).drop_column(Site::Country).to_owned())
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Country,
}
