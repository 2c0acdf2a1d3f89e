use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1603000000000_add_site_gaw")
        // WMO GAW 站点代码，不是所有站点都有
        .up(
            Table::alter()
                .table(Site::Table)
                .add_column(ColumnDef::new(Site::Gaw).string_len(8).null())
                .to_owned(),
        )
        .down(Table::alter().table(Site::Table).drop_column(Site::Gaw).to_owned())
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Gaw,
}
