//! 迁移执行器。
//!
//! 单写者模型：同一数据库同一时间只允许一个进程执行迁移，执行器本身不做分布式加锁，
//! 由部署流程保证串行。每条迁移的结构变更和记录表写入放在同一个显式事务里，
//! 迁移之间严格顺序执行，遇到第一个失败立即停止。

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use sea_orm_migration::SchemaManager;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::MigrationError;
use crate::ledger::{ConsistencyReport, Ledger};
use crate::name::MigrationName;
use crate::record::{Direction, MigrationRecord, Reversal, SchemaStep};
use crate::store;

/// `apply` 的目标
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    Latest,
    /// 执行到指定迁移（包含该迁移）为止
    Name(String),
}

/// 回退到不可逆迁移时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IrreversiblePolicy {
    /// 结构保持不变，只删除记录表中的对应行并打印警告
    #[default]
    Skip,
    /// 拒绝回退，本次运行在该迁移处停止
    Refuse,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedReport {
    pub applied: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevertedReport {
    pub reverted: Vec<String>,
    /// 其中回退动作为空操作的不可逆迁移
    pub irreversible: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
    pub in_ledger: bool,
    pub reversible: bool,
}

pub struct Runner<'l> {
    ledger: &'l Ledger,
    irreversible: IrreversiblePolicy,
}

impl<'l> Runner<'l> {
    pub fn new(ledger: &'l Ledger) -> Self {
        Self {
            ledger,
            irreversible: IrreversiblePolicy::default(),
        }
    }

    pub fn irreversible_policy(mut self, policy: IrreversiblePolicy) -> Self {
        self.irreversible = policy;
        self
    }

    /// 执行待应用的迁移，返回本次成功应用的迁移名称
    pub async fn apply(&self, db: &DatabaseConnection, target: Target) -> Result<AppliedReport, MigrationError> {
        let limit = match &target {
            Target::Latest => None,
            Target::Name(name) => Some(
                self.ledger
                    .position(name)
                    .ok_or_else(|| MigrationError::UnknownTarget(name.clone()))?,
            ),
        };

        store::ensure_table(db).await?;
        let applied = applied_names(db).await?;
        let pending: Vec<&MigrationRecord> = self
            .ledger
            .pending(&applied)
            .into_iter()
            .take_while(|record| match limit {
                Some(limit) => self.ledger.position(record.name()).is_some_and(|position| position <= limit),
                None => true,
            })
            .collect();

        if pending.is_empty() {
            debug!("没有待执行的迁移");
            return Ok(AppliedReport::default());
        }
        info!("共有 {} 个待执行的迁移", pending.len());

        let mut report = AppliedReport::default();
        for record in pending {
            info!("正在应用迁移 {}", record.name());
            if let Err(cause) = apply_one(db, record).await {
                error!("迁移 {} 执行失败，已回滚: {}", record.name(), cause);
                return Err(MigrationError::Failed {
                    name: record.name().to_owned(),
                    direction: Direction::Up,
                    completed: report.applied,
                    cause,
                });
            }
            report.applied.push(record.name().to_owned());
        }
        info!("迁移完成，本次应用了 {} 个迁移", report.applied.len());
        Ok(report)
    }

    /// 按应用顺序倒序回退最近的 `count` 个迁移
    pub async fn revert(&self, db: &DatabaseConnection, count: NonZeroUsize) -> Result<RevertedReport, MigrationError> {
        store::ensure_table(db).await?;
        let mut applied: Vec<String> = store::applied(db).await?.into_iter().map(|row| row.name).collect();
        // 按时间戳倒序，无法解析的名称排在最后，只有真正轮到时才报错
        applied.sort_by_cached_key(|name| {
            let timestamp = MigrationName::parse(name).ok().map(|parsed| parsed.timestamp());
            Reverse((timestamp, name.clone()))
        });

        let mut report = RevertedReport::default();
        for name in applied.into_iter().take(count.get()) {
            let Some(record) = self.ledger.get(&name) else {
                error!("已应用的迁移 {} 不在台账中，无法回退", name);
                return Err(MigrationError::UnknownApplied {
                    name,
                    completed: report.reverted,
                });
            };

            let steps: &[SchemaStep] = match record.reversal() {
                Reversal::Steps(steps) => steps.as_slice(),
                Reversal::Irreversible { reason } => match self.irreversible {
                    IrreversiblePolicy::Refuse => {
                        error!("迁移 {} 不可逆，拒绝回退: {}", name, reason);
                        return Err(MigrationError::Irreversible {
                            name: name.clone(),
                            reason: (*reason).to_owned(),
                            completed: report.reverted,
                        });
                    }
                    IrreversiblePolicy::Skip => {
                        warn!("迁移 {} 不可逆（{}），数据库结构保持不变，仅删除执行记录", name, reason);
                        report.irreversible.push(name.clone());
                        &[]
                    }
                },
            };

            info!("正在回退迁移 {}", name);
            if let Err(cause) = revert_one(db, record.name(), steps).await {
                error!("迁移 {} 回退失败，已回滚: {}", name, cause);
                return Err(MigrationError::Failed {
                    name: name.clone(),
                    direction: Direction::Down,
                    completed: report.reverted,
                    cause,
                });
            }
            report.reverted.push(name);
        }
        info!("回退完成，本次回退了 {} 个迁移", report.reverted.len());
        Ok(report)
    }

    /// 检查记录表与台账是否一致，只报告，不修正
    pub async fn verify(&self, db: &DatabaseConnection) -> Result<ConsistencyReport, MigrationError> {
        let applied = if store::exists(db).await? {
            applied_names(db).await?
        } else {
            HashSet::new()
        };
        let report = self.ledger.consistency(&applied);
        for warning in &report.warnings {
            warn!("{}", warning);
        }
        Ok(report)
    }

    /// 台账中每个迁移的执行状态，末尾附上不在台账中的执行记录
    pub async fn status(&self, db: &DatabaseConnection) -> Result<Vec<MigrationStatus>, MigrationError> {
        let mut applied: HashMap<String, DateTime<Utc>> = if store::exists(db).await? {
            store::applied(db)
                .await?
                .into_iter()
                .map(|row| (row.name, row.applied_at))
                .collect()
        } else {
            HashMap::new()
        };

        let mut statuses: Vec<MigrationStatus> = self
            .ledger
            .all()
            .map(|record| MigrationStatus {
                name: record.name().to_owned(),
                applied_at: applied.remove(record.name()),
                in_ledger: true,
                reversible: record.is_reversible(),
            })
            .collect();

        let mut orphans: Vec<(String, DateTime<Utc>)> = applied.into_iter().collect();
        orphans.sort();
        statuses.extend(orphans.into_iter().map(|(name, applied_at)| MigrationStatus {
            name,
            applied_at: Some(applied_at),
            in_ledger: false,
            reversible: false,
        }));
        Ok(statuses)
    }
}

async fn applied_names(db: &DatabaseConnection) -> Result<HashSet<String>, DbErr> {
    Ok(store::applied(db).await?.into_iter().map(|row| row.name).collect())
}

async fn apply_one(db: &DatabaseConnection, record: &MigrationRecord) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    let outcome = async {
        let manager = SchemaManager::new(&txn);
        for step in record.up_steps() {
            step.run(&manager).await?;
        }
        store::record_applied(&txn, record.name(), Utc::now()).await
    }
    .await;

    match outcome {
        Ok(()) => txn.commit().await,
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!("回滚迁移 {} 的事务失败: {}", record.name(), rollback_err);
            }
            Err(e)
        }
    }
}

async fn revert_one(db: &DatabaseConnection, name: &str, steps: &[SchemaStep]) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    let outcome = async {
        let manager = SchemaManager::new(&txn);
        for step in steps {
            step.run(&manager).await?;
        }
        store::remove(&txn, name).await
    }
    .await;

    match outcome {
        Ok(()) => txn.commit().await,
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!("回滚迁移 {} 的事务失败: {}", name, rollback_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use sea_orm_migration::prelude::*;

    use super::*;
    use crate::testing::memory_db;

    #[derive(DeriveIden, Clone, Copy)]
    enum Sample {
        Table,
        Id,
        X,
        Y,
    }

    fn create_sample() -> MigrationRecord {
        MigrationRecord::new("1_create_sample")
            .up(
                Table::create()
                    .table(Sample::Table)
                    .col(ColumnDef::new(Sample::Id).integer().not_null().primary_key())
                    .to_owned(),
            )
            .down(Table::drop().table(Sample::Table).if_exists().to_owned())
    }

    fn add_column(name: &str, column: Sample) -> MigrationRecord {
        MigrationRecord::new(name)
            .up(
                Table::alter()
                    .table(Sample::Table)
                    .add_column(ColumnDef::new(column).integer().null())
                    .to_owned(),
            )
            .down(Table::alter().table(Sample::Table).drop_column(column).to_owned())
    }

    fn broken(name: &str) -> MigrationRecord {
        MigrationRecord::new(name).up(SchemaStep::raw("ALTER TABLE missing_table ADD COLUMN y INTEGER"))
    }

    /// A = 加列 x，B = 加列 y，另外有一条建表迁移排在最前
    fn sample_ledger() -> Ledger {
        Ledger::new(vec![
            add_column("3_add_col_y", Sample::Y),
            create_sample(),
            add_column("2_add_col_x", Sample::X),
        ])
        .unwrap()
    }

    async fn store_names(db: &DatabaseConnection) -> Vec<String> {
        let mut names: Vec<String> = store::applied(db).await.unwrap().into_iter().map(|m| m.name).collect();
        names.sort();
        names
    }

    async fn has_column(db: &DatabaseConnection, column: &str) -> bool {
        SchemaManager::new(db).has_column("sample", column).await.unwrap()
    }

    #[tokio::test]
    async fn test_apply_all_in_order() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let report = Runner::new(&ledger).apply(&db, Target::Latest).await.unwrap();
        assert_eq!(report.applied, vec!["1_create_sample", "2_add_col_x", "3_add_col_y"]);
        assert_eq!(store_names(&db).await, vec!["1_create_sample", "2_add_col_x", "3_add_col_y"]);
        assert!(has_column(&db, "x").await);
        assert!(has_column(&db, "y").await);
    }

    #[tokio::test]
    async fn test_apply_twice_is_noop() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);
        runner.apply(&db, Target::Latest).await.unwrap();
        let second = runner.apply(&db, Target::Latest).await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(store_names(&db).await.len(), 3);
    }

    #[tokio::test]
    async fn test_apply_only_pending() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);
        runner
            .apply(&db, Target::Name("2_add_col_x".to_string()))
            .await
            .unwrap();
        assert_eq!(store_names(&db).await, vec!["1_create_sample", "2_add_col_x"]);
        assert!(!has_column(&db, "y").await);

        let report = runner.apply(&db, Target::Latest).await.unwrap();
        assert_eq!(report.applied, vec!["3_add_col_y"]);
    }

    #[tokio::test]
    async fn test_apply_unknown_target() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let err = Runner::new(&ledger)
            .apply(&db, Target::Name("9_missing".to_string()))
            .await
            .unwrap_err();
        assert_matches!(err, MigrationError::UnknownTarget(name) if name == "9_missing");
        // 目标校验先于任何写入
        assert!(!store::exists(&db).await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_halts_run() {
        let db = memory_db().await;
        let ledger = Ledger::new(vec![
            create_sample(),
            add_column("2_add_col_x", Sample::X),
            broken("3_broken"),
            add_column("4_add_col_y", Sample::Y),
        ])
        .unwrap();

        let err = Runner::new(&ledger).apply(&db, Target::Latest).await.unwrap_err();
        assert_eq!(err.completed(), ["1_create_sample", "2_add_col_x"]);
        assert_matches!(
            err,
            MigrationError::Failed { ref name, direction: Direction::Up, .. } if name == "3_broken"
        );
        assert_eq!(store_names(&db).await, vec!["1_create_sample", "2_add_col_x"]);
        // 后续迁移不会被尝试
        assert!(!has_column(&db, "y").await);
    }

    #[tokio::test]
    async fn test_failed_record_is_rolled_back_as_a_whole() {
        let db = memory_db().await;
        let ledger = Ledger::new(vec![
            create_sample(),
            MigrationRecord::new("2_half_done")
                .up(
                    Table::alter()
                        .table(Sample::Table)
                        .add_column(ColumnDef::new(Sample::X).integer().null())
                        .to_owned(),
                )
                .up(SchemaStep::raw("ALTER TABLE missing_table ADD COLUMN y INTEGER")),
        ])
        .unwrap();

        let err = Runner::new(&ledger).apply(&db, Target::Latest).await.unwrap_err();
        assert_matches!(err, MigrationError::Failed { ref name, .. } if name == "2_half_done");
        assert!(!has_column(&db, "x").await);
        assert_eq!(store_names(&db).await, vec!["1_create_sample"]);
    }

    #[tokio::test]
    async fn test_revert_latest() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);
        runner.apply(&db, Target::Latest).await.unwrap();

        let report = runner.revert(&db, NonZeroUsize::MIN).await.unwrap();
        assert_eq!(report.reverted, vec!["3_add_col_y"]);
        assert!(report.irreversible.is_empty());
        assert_eq!(store_names(&db).await, vec!["1_create_sample", "2_add_col_x"]);
        assert!(!has_column(&db, "y").await);
        assert!(has_column(&db, "x").await);
    }

    #[tokio::test]
    async fn test_apply_then_revert_round_trip() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);
        runner
            .apply(&db, Target::Name("2_add_col_x".to_string()))
            .await
            .unwrap();
        let before = store_names(&db).await;

        runner.apply(&db, Target::Latest).await.unwrap();
        runner.revert(&db, NonZeroUsize::MIN).await.unwrap();
        assert_eq!(store_names(&db).await, before);
    }

    #[tokio::test]
    async fn test_revert_more_than_applied() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);
        runner.apply(&db, Target::Latest).await.unwrap();

        let report = runner.revert(&db, NonZeroUsize::new(10).unwrap()).await.unwrap();
        assert_eq!(report.reverted, vec!["3_add_col_y", "2_add_col_x", "1_create_sample"]);
        assert!(store_names(&db).await.is_empty());
        assert!(!SchemaManager::new(&db).has_table("sample").await.unwrap());
    }

    fn irreversible_ledger() -> Ledger {
        Ledger::new(vec![
            create_sample(),
            add_column("2_add_col_x", Sample::X),
            MigrationRecord::new("3_drop_col_x")
                .up(Table::alter().table(Sample::Table).drop_column(Sample::X).to_owned())
                .irreversible("x 列的数据已丢弃"),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_revert_irreversible_skips_schema() {
        let db = memory_db().await;
        let ledger = irreversible_ledger();
        let runner = Runner::new(&ledger);
        runner.apply(&db, Target::Latest).await.unwrap();
        assert!(!has_column(&db, "x").await);

        let report = runner.revert(&db, NonZeroUsize::MIN).await.unwrap();
        assert_eq!(report.reverted, vec!["3_drop_col_x"]);
        assert_eq!(report.irreversible, vec!["3_drop_col_x"]);
        assert_eq!(store_names(&db).await, vec!["1_create_sample", "2_add_col_x"]);
        // 结构不变：x 列不会被恢复
        assert!(!has_column(&db, "x").await);
    }

    #[tokio::test]
    async fn test_revert_irreversible_refused() {
        let db = memory_db().await;
        let ledger = irreversible_ledger();
        let runner = Runner::new(&ledger).irreversible_policy(IrreversiblePolicy::Refuse);
        runner.apply(&db, Target::Latest).await.unwrap();

        let err = runner.revert(&db, NonZeroUsize::new(2).unwrap()).await.unwrap_err();
        assert_matches!(err, MigrationError::Irreversible { ref name, ref completed, .. }
            if name == "3_drop_col_x" && completed.is_empty());
        assert_eq!(store_names(&db).await.len(), 3);
    }

    #[tokio::test]
    async fn test_revert_unknown_applied() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);
        runner.apply(&db, Target::Latest).await.unwrap();
        store::record_applied(&db, "9_removed_from_ledger", Utc::now()).await.unwrap();

        let err = runner.revert(&db, NonZeroUsize::MIN).await.unwrap_err();
        assert_matches!(err, MigrationError::UnknownApplied { ref name, .. } if name == "9_removed_from_ledger");
        assert_eq!(store_names(&db).await.len(), 4);
    }

    #[tokio::test]
    async fn test_revert_ignores_unparseable_row_until_reached() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);
        runner.apply(&db, Target::Latest).await.unwrap();
        store::record_applied(&db, "legacy", Utc::now()).await.unwrap();

        let report = runner.revert(&db, NonZeroUsize::MIN).await.unwrap();
        assert_eq!(report.reverted, vec!["3_add_col_y"]);
        assert!(!has_column(&db, "y").await);

        // 台账内的迁移全部回退后才轮到无法解析的记录
        let err = runner.revert(&db, NonZeroUsize::new(3).unwrap()).await.unwrap_err();
        assert_matches!(err, MigrationError::UnknownApplied { ref name, ref completed }
            if name == "legacy" && completed == &["2_add_col_x", "1_create_sample"]);
        assert_eq!(store_names(&db).await, vec!["legacy"]);
    }

    #[tokio::test]
    async fn test_revert_failure_halts_run() {
        let db = memory_db().await;
        let ledger = Ledger::new(vec![
            create_sample(),
            MigrationRecord::new("2_add_col_x_broken_down")
                .up(
                    Table::alter()
                        .table(Sample::Table)
                        .add_column(ColumnDef::new(Sample::X).integer().null())
                        .to_owned(),
                )
                .down(SchemaStep::raw("ALTER TABLE missing_table DROP COLUMN x")),
            add_column("3_add_col_y", Sample::Y),
        ])
        .unwrap();
        let runner = Runner::new(&ledger);
        runner.apply(&db, Target::Latest).await.unwrap();

        let err = runner.revert(&db, NonZeroUsize::new(3).unwrap()).await.unwrap_err();
        assert_eq!(err.completed(), ["3_add_col_y"]);
        assert_matches!(
            err,
            MigrationError::Failed { ref name, direction: Direction::Down, .. } if name == "2_add_col_x_broken_down"
        );
        // 失败的迁移记录仍在，更早的迁移不会被尝试
        assert_eq!(store_names(&db).await, vec!["1_create_sample", "2_add_col_x_broken_down"]);
        assert!(has_column(&db, "x").await);
        assert!(SchemaManager::new(&db).has_table("sample").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_and_status() {
        let db = memory_db().await;
        let ledger = sample_ledger();
        let runner = Runner::new(&ledger);

        // 记录表尚不存在时不应报错
        assert!(runner.verify(&db).await.unwrap().is_consistent());
        assert!(runner.status(&db).await.unwrap().iter().all(|s| s.applied_at.is_none()));

        runner.apply(&db, Target::Latest).await.unwrap();
        assert!(runner.verify(&db).await.unwrap().is_consistent());

        store::remove(&db, "2_add_col_x").await.unwrap();
        store::record_applied(&db, "9_orphan", Utc::now()).await.unwrap();
        let report = runner.verify(&db).await.unwrap();
        assert_eq!(report.warnings.len(), 2);

        let status = runner.status(&db).await.unwrap();
        let summary: Vec<(&str, bool, bool)> = status
            .iter()
            .map(|s| (s.name.as_str(), s.applied_at.is_some(), s.in_ledger))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1_create_sample", true, true),
                ("2_add_col_x", false, true),
                ("3_add_col_y", true, true),
                ("9_orphan", true, false),
            ]
        );
    }
}
