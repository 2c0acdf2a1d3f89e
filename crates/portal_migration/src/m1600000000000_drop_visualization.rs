use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1600000000000_drop_visualization")
        .up(Table::drop().table(Visualization::Table).if_exists().to_owned())
        .irreversible("可视化图片已迁移到对象存储，表中的元数据不再保留")
}

#[derive(DeriveIden)]
enum Visualization {
    Table,
}
