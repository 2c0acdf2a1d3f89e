use sea_orm_migration::prelude::*;

use crate::record::{MigrationRecord, SchemaStep};

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1582000000000_add_product_level")
        .up(
            Table::alter()
                .table(Product::Table)
                .add_column(ColumnDef::new(Product::Level).string_len(8).not_null().default("1b"))
                .to_owned(),
        )
        // 已有产品按处理级别回填
        .up(SchemaStep::raw("UPDATE product SET level = '1c' WHERE id = 'categorize'"))
        .up(SchemaStep::raw(
            "UPDATE product SET level = '2' WHERE id IN ('classification', 'iwc', 'lwc', 'drizzle')",
        ))
        .down(Table::alter().table(Product::Table).drop_column(Product::Level).to_owned())
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Level,
}
