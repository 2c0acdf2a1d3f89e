//! 已执行迁移记录表（Applied-Migrations Store）。
//!
//! 每条已执行的迁移对应一行，主键为迁移名称，另有一列执行时间。除 [`exists`] 外，
//! 所有函数都对 [`ConnectionTrait`] 泛型，既可以在连接池上调用，也可以放进单条迁移的事务里，
//! 保证结构变更与记录写入在同一个事务中提交。

pub mod applied_migration;

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityName, EntityTrait, Schema, Set};
use sea_orm_migration::SchemaManager;

pub use applied_migration::Model as AppliedMigration;

/// 记录表不存在时创建
pub async fn ensure_table<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let stmt = Schema::new(backend)
        .create_table_from_entity(applied_migration::Entity)
        .if_not_exists()
        .to_owned();
    conn.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// 记录表是否存在，只读，不会顺带建表
pub async fn exists(db: &DatabaseConnection) -> Result<bool, DbErr> {
    SchemaManager::new(db)
        .has_table(applied_migration::Entity.table_name())
        .await
}

/// 全部已执行记录，顺序不做保证，需要排序时按 [`crate::MigrationName`] 排
pub async fn applied<C: ConnectionTrait>(conn: &C) -> Result<Vec<AppliedMigration>, DbErr> {
    applied_migration::Entity::find().all(conn).await
}

pub async fn record_applied<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    applied_at: DateTime<Utc>,
) -> Result<(), DbErr> {
    let model = applied_migration::ActiveModel {
        name: Set(name.to_owned()),
        applied_at: Set(applied_at),
    };
    applied_migration::Entity::insert(model)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub async fn remove<C: ConnectionTrait>(conn: &C, name: &str) -> Result<(), DbErr> {
    let result = applied_migration::Entity::delete_by_id(name.to_owned())
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("migration {name} is not recorded as applied")));
    }
    Ok(())
}
