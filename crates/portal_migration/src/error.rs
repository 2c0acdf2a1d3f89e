use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

use crate::record::Direction;

/// 台账构建阶段的错误，出现即说明迁移列表本身配置有误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("duplicate migration name: {0}")]
    DuplicateName(String),
    #[error("malformed migration name {0:?}, expected <epoch-millis>_<description>")]
    MalformedName(String),
    #[error("migrations {first} and {second} share the timestamp {timestamp}")]
    DuplicateTimestamp {
        timestamp: u64,
        first: String,
        second: String,
    },
}

/// 执行迁移时的错误
///
/// `completed` 记录本次运行中在出错之前已经提交的迁移，这些迁移保持已应用状态。
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("migration {name} failed while running {direction}: {cause}")]
    Failed {
        name: String,
        direction: Direction,
        completed: Vec<String>,
        #[source]
        cause: DbErr,
    },
    #[error("migration {name} is irreversible: {reason}")]
    Irreversible {
        name: String,
        reason: String,
        completed: Vec<String>,
    },
    #[error("target migration {0} is not in the ledger")]
    UnknownTarget(String),
    #[error("applied migration {name} is not in the ledger and cannot be reverted")]
    UnknownApplied { name: String, completed: Vec<String> },
    #[error("migration store error: {0}")]
    Store(#[from] DbErr),
}

impl MigrationError {
    /// 出错前本次运行已经提交的迁移
    pub fn completed(&self) -> &[String] {
        match self {
            MigrationError::Failed { completed, .. }
            | MigrationError::Irreversible { completed, .. }
            | MigrationError::UnknownApplied { completed, .. } => completed,
            MigrationError::UnknownTarget(_) | MigrationError::Store(_) => &[],
        }
    }
}

/// 一致性检查发现的问题，只作为警告报告给运维人员，不会自动修正
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyWarning {
    #[error("applied migration {name} is not present in the ledger")]
    Orphaned { name: String },
    #[error("migration {pending} is not applied but the later migration {applied_after} is")]
    OutOfOrder { pending: String, applied_after: String },
}
