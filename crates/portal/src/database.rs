use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use portal_migration::{Ledger, Runner, Target};
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use tracing::debug;

fn is_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:")
}

fn is_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// 创建 SQLite 连接选项（带所有优化配置）
fn create_sqlite_options(url: &str) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("无法解析 SQLite 连接地址 {url}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(90));
    if is_memory(url) {
        return Ok(options);
    }
    Ok(options
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .optimize_on_close(true, None)
        .pragma("cache_size", "-65536")
        .pragma("temp_store", "MEMORY"))
}

async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection> {
    if is_sqlite(url) {
        // 内存库只能有一个连接，否则每个连接各自是一个空库
        let in_memory = is_memory(url);
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections })
            .min_connections(if in_memory { 1 } else { 0 })
            .acquire_timeout(Duration::from_secs(90))
            .idle_timeout((!in_memory).then(|| Duration::from_secs(600)))
            .max_lifetime((!in_memory).then(|| Duration::from_secs(3600)))
            .connect_with(create_sqlite_options(url)?)
            .await
            .context("创建 SQLite 连接池失败")?;
        debug!("SQLite 连接池已创建，最大连接数 {}", if in_memory { 1 } else { max_connections });
        return Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool));
    }

    let mut options = ConnectOptions::new(url.to_owned());
    options
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(90))
        .sqlx_logging(false);
    let connection = Database::connect(options).await.context("连接数据库失败")?;
    debug!("数据库连接池已创建，最大连接数 {}", max_connections);
    Ok(connection)
}

/// 业务使用的数据库连接池
pub async fn database_connection(url: &str) -> Result<DatabaseConnection> {
    connect(url, 10).await
}

/// 迁移专用的单连接池，与单写者模型一致
pub async fn migration_connection(url: &str) -> Result<DatabaseConnection> {
    connect(url, 1).await
}

/// 执行全部迁移并返回业务连接池
pub async fn setup_database(url: &str, ledger: &Ledger) -> Result<DatabaseConnection> {
    if is_memory(url) {
        let connection = database_connection(url).await?;
        Runner::new(ledger).apply(&connection, Target::Latest).await?;
        return Ok(connection);
    }

    let connection = migration_connection(url).await?;
    Runner::new(ledger).apply(&connection, Target::Latest).await?;
    // 显式关闭迁移连接池，释放数据库锁
    connection.close().await.context("关闭迁移连接池失败")?;
    debug!("迁移完成，已关闭迁移连接池");

    database_connection(url).await
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, DbBackend};

    use super::*;

    #[test]
    fn test_url_detection() {
        assert!(is_sqlite("sqlite::memory:"));
        assert!(is_sqlite("sqlite:///var/lib/dataportal/portal.sqlite"));
        assert!(!is_sqlite("postgres://portal@localhost/dataportal"));
        assert!(is_memory("sqlite::memory:"));
        assert!(is_memory("sqlite://portal?mode=memory&cache=shared"));
        assert!(!is_memory("sqlite:///var/lib/dataportal/portal.sqlite"));
    }

    #[tokio::test]
    async fn test_setup_memory_database() {
        let ledger = portal_migration::ledger().unwrap();
        let connection = setup_database("sqlite::memory:", &ledger).await.unwrap();
        assert_eq!(connection.get_database_backend(), DbBackend::Sqlite);

        let status = Runner::new(&ledger).status(&connection).await.unwrap();
        assert!(status.iter().all(|s| s.applied_at.is_some()));
    }

    #[tokio::test]
    async fn test_entities_match_migrated_schema() {
        use portal_entity::entities::*;
        use sea_orm::EntityTrait;

        let ledger = portal_migration::ledger().unwrap();
        let connection = setup_database("sqlite::memory:", &ledger).await.unwrap();
        // 实体的每一列都必须存在，否则查询会直接报错
        assert!(site::Entity::find().all(&connection).await.unwrap().is_empty());
        assert!(instrument::Entity::find().all(&connection).await.unwrap().is_empty());
        assert!(product::Entity::find().all(&connection).await.unwrap().is_empty());
        assert!(file::Entity::find().all(&connection).await.unwrap().is_empty());
        assert!(task::Entity::find().all(&connection).await.unwrap().is_empty());
        assert!(download::Entity::find().all(&connection).await.unwrap().is_empty());
        assert!(publication::Entity::find().all(&connection).await.unwrap().is_empty());
    }
}
