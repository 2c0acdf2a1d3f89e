use sea_orm::{ConnectionTrait, DbErr};
use sea_orm_migration::prelude::*;
use serde::Serialize;
use strum::Display;

/// 迁移方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// 一次结构变更，以数据形式保存，执行时交给 [`SchemaManager`]
#[derive(Debug, Clone)]
pub enum SchemaStep {
    CreateTable(TableCreateStatement),
    DropTable(TableDropStatement),
    AlterTable(TableAlterStatement),
    RenameTable(TableRenameStatement),
    CreateIndex(IndexCreateStatement),
    DropIndex(IndexDropStatement),
    CreateForeignKey(ForeignKeyCreateStatement),
    DropForeignKey(ForeignKeyDropStatement),
    /// 与结构变更配套的数据修正，必须是各后端通用的 SQL
    Raw(String),
}

impl SchemaStep {
    pub fn raw(sql: impl Into<String>) -> Self {
        SchemaStep::Raw(sql.into())
    }

    pub(crate) async fn run(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        match self {
            SchemaStep::CreateTable(stmt) => manager.create_table(stmt.clone()).await,
            SchemaStep::DropTable(stmt) => manager.drop_table(stmt.clone()).await,
            SchemaStep::AlterTable(stmt) => manager.alter_table(stmt.clone()).await,
            SchemaStep::RenameTable(stmt) => manager.rename_table(stmt.clone()).await,
            SchemaStep::CreateIndex(stmt) => manager.create_index(stmt.clone()).await,
            SchemaStep::DropIndex(stmt) => manager.drop_index(stmt.clone()).await,
            SchemaStep::CreateForeignKey(stmt) => manager.create_foreign_key(stmt.clone()).await,
            SchemaStep::DropForeignKey(stmt) => manager.drop_foreign_key(stmt.clone()).await,
            SchemaStep::Raw(sql) => manager
                .get_connection()
                .execute_unprepared(sql)
                .await
                .map(|_| ()),
        }
    }
}

macro_rules! impl_from_statement {
    ($($stmt:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$stmt> for SchemaStep {
                fn from(stmt: $stmt) -> Self {
                    SchemaStep::$variant(stmt)
                }
            }
        )*
    };
}

impl_from_statement! {
    TableCreateStatement => CreateTable,
    TableDropStatement => DropTable,
    TableAlterStatement => AlterTable,
    TableRenameStatement => RenameTable,
    IndexCreateStatement => CreateIndex,
    IndexDropStatement => DropIndex,
    ForeignKeyCreateStatement => CreateForeignKey,
    ForeignKeyDropStatement => DropForeignKey,
}

/// 迁移的回退动作
#[derive(Debug, Clone)]
pub enum Reversal {
    /// 按列出的顺序执行，这些步骤本身已经是 up 的逆序列
    Steps(Vec<SchemaStep>),
    /// 明确记录的空操作：被删除的数据无法重建
    Irreversible { reason: &'static str },
}

/// 一条迁移记录：名称、up 动作与 down 动作
///
/// ```ignore
/// MigrationRecord::new("1577270000000_add_site_country")
///     .up(Table::alter().table(Site::Table).add_column(..).to_owned())
///     .down(Table::alter().table(Site::Table).drop_column(Site::Country).to_owned())
/// ```
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    name: String,
    up: Vec<SchemaStep>,
    down: Reversal,
}

impl MigrationRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up: Vec::new(),
            down: Reversal::Steps(Vec::new()),
        }
    }

    pub fn up(mut self, step: impl Into<SchemaStep>) -> Self {
        self.up.push(step.into());
        self
    }

    /// 追加一个回退步骤。已标记为不可逆的记录再追加步骤会恢复为普通回退。
    pub fn down(mut self, step: impl Into<SchemaStep>) -> Self {
        match &mut self.down {
            Reversal::Steps(steps) => steps.push(step.into()),
            Reversal::Irreversible { .. } => self.down = Reversal::Steps(vec![step.into()]),
        }
        self
    }

    pub fn irreversible(mut self, reason: &'static str) -> Self {
        self.down = Reversal::Irreversible { reason };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up_steps(&self) -> &[SchemaStep] {
        &self.up
    }

    pub fn reversal(&self) -> &Reversal {
        &self.down
    }

    pub fn is_reversible(&self) -> bool {
        matches!(self.down, Reversal::Steps(_))
    }
}
