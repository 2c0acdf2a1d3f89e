use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1596000000000_add_product_experimental")
        .up(
            Table::alter()
                .table(Product::Table)
                .add_column(ColumnDef::new(Product::Experimental).boolean().not_null().default(false))
                .to_owned(),
        )
        .down(
            Table::alter()
                .table(Product::Table)
                .drop_column(Product::Experimental)
                .to_owned(),
        )
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Experimental,
}
