//! 数据门户的数据库结构迁移台账与执行器。
//!
//! 每条迁移是一条 [`MigrationRecord`] 数据：名称（毫秒时间戳前缀）、up 步骤与 down 步骤。
//! [`ledger()`] 按时间戳排序给出完整台账，[`Runner`] 根据记录表计算待执行集合并逐条在事务中执行。

mod error;
mod ledger;
mod name;
mod record;
mod runner;
pub mod store;

mod m1575985412000_initial_schema;
mod m1576059212000_create_file;
mod m1577270000000_add_site_country;
mod m1578300000000_create_visualization;
mod m1579000000000_add_file_measurement_date_index;
mod m1580400000000_rename_file_hash_to_checksum;
mod m1582000000000_add_product_level;
mod m1584000000000_create_task;
mod m1587000000000_create_download;
mod m1589000000000_drop_file_download_count;
mod m1592000000000_create_publication;
mod m1596000000000_add_product_experimental;
mod m1600000000000_drop_visualization;
mod m1603000000000_add_site_gaw;
mod m1606000000000_add_instrument_pid;

pub use error::{ConsistencyWarning, LedgerError, MigrationError};
pub use ledger::{ConsistencyReport, Ledger};
pub use name::MigrationName;
pub use record::{Direction, MigrationRecord, Reversal, SchemaStep};
pub use runner::{AppliedReport, IrreversiblePolicy, MigrationStatus, RevertedReport, Runner, Target};

/// 产品数据库的完整迁移台账
pub fn ledger() -> Result<Ledger, LedgerError> {
    Ledger::new(vec![
        m1575985412000_initial_schema::migration(),
        m1576059212000_create_file::migration(),
        m1577270000000_add_site_country::migration(),
        m1578300000000_create_visualization::migration(),
        m1579000000000_add_file_measurement_date_index::migration(),
        m1580400000000_rename_file_hash_to_checksum::migration(),
        m1582000000000_add_product_level::migration(),
        m1584000000000_create_task::migration(),
        m1587000000000_create_download::migration(),
        m1589000000000_drop_file_download_count::migration(),
        m1592000000000_create_publication::migration(),
        m1596000000000_add_product_experimental::migration(),
        m1600000000000_drop_visualization::migration(),
        m1603000000000_add_site_gaw::migration(),
        m1606000000000_add_instrument_pid::migration(),
    ])
}
