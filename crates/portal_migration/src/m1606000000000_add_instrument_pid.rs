use sea_orm_migration::prelude::*;

use crate::record::MigrationRecord;

pub fn migration() -> MigrationRecord {
    MigrationRecord::new("1606000000000_add_instrument_pid")
        .up(
            Table::alter()
                .table(Instrument::Table)
                .add_column(ColumnDef::new(Instrument::Pid).string().null())
                .to_owned(),
        )
        .down(
            Table::alter()
                .table(Instrument::Table)
                .drop_column(Instrument::Pid)
                .to_owned(),
        )
}

#[derive(DeriveIden)]
enum Instrument {
    Table,
    Pid,
}
