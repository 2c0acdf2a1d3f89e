//! 全部迁移执行完毕后的产品数据库结构

pub mod prelude;

pub mod download;
pub mod file;
pub mod instrument;
pub mod product;
pub mod publication;
pub mod site;
pub mod task;
