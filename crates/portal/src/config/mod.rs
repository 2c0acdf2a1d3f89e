use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;

/// 配置目录，可以通过 `DATAPORTAL_CONFIG_DIR` 覆盖
pub static CONFIG_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var_os("DATAPORTAL_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dataportal")
        })
});

#[derive(Parser, Debug)]
#[command(name = "dataportal", version, about = "数据门户数据库迁移与参考数据工具")]
pub struct Args {
    /// 数据库连接地址，未指定时使用配置目录下的 SQLite 文件
    #[arg(long, env = "DATAPORTAL_DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// 日志级别
    #[arg(long, env = "DATAPORTAL_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// 数据库结构迁移
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// 导入参考数据（站点、仪器、产品）
    Seed {
        /// 参考数据 JSON 文件，未指定时使用内置数据
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// 执行全部迁移后导入参考数据
    Setup {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum MigrateAction {
    /// 执行待应用的迁移
    Up {
        /// 执行到指定迁移（包含）为止
        #[arg(long)]
        to: Option<String>,
    },
    /// 回退最近应用的迁移
    Down {
        #[arg(long, default_value = "1")]
        count: NonZeroUsize,
        /// 遇到不可逆迁移时报错，而不是只删除执行记录
        #[arg(long)]
        refuse_irreversible: bool,
    },
    /// 列出每个迁移的执行状态
    Status {
        #[arg(long)]
        json: bool,
    },
    /// 检查执行记录与台账是否一致
    Verify {
        #[arg(long)]
        json: bool,
        /// 有警告时以非零状态退出
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub log_level: String,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let database_url = match &args.database_url {
            Some(url) => url.clone(),
            None => default_database_url()?,
        };
        Ok(Self {
            database_url,
            log_level: args.log_level.clone(),
        })
    }
}

fn default_database_url() -> Result<String> {
    if !CONFIG_DIR.exists() {
        std::fs::create_dir_all(&*CONFIG_DIR)
            .with_context(|| format!("创建配置目录 {} 失败", CONFIG_DIR.display()))?;
    }
    Ok(format!("sqlite://{}", CONFIG_DIR.join("portal.sqlite").display()))
}
