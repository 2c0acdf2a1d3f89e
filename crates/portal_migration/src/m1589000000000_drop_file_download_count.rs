use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1589000000000_drop_file_download_count")
        .up(
            Table::alter()
                .table(File::Table)
                .drop_column(File::DownloadCount)
                .to_owned(),
        )
        // 逐文件下载计数已由 download 表取代，回退只恢复列结构，旧计数无法重建
        .down(
            Table::alter()
                .table(File::Table)
                .add_column(ColumnDef::new(File::DownloadCount).integer().not_null().default(0))
                .to_owned(),
        )
}

#[derive(DeriveIden)]
enum File {
    Table,
    DownloadCount,
}
