use std::cmp::Ordering;
use std::fmt;

use crate::error::LedgerError;

/// 迁移名称：毫秒时间戳前缀 + 描述后缀，例如 `1576059212000_create_file`
///
/// 全局顺序只由这里解析出的 `timestamp` 决定，其它地方不要再自行解析名称字符串。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationName {
    timestamp: u64,
    raw: String,
}

impl MigrationName {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let malformed = || LedgerError::MalformedName(raw.to_owned());

        let (prefix, suffix) = raw.split_once('_').ok_or_else(malformed)?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if suffix.is_empty()
            || !suffix
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(malformed());
        }
        let timestamp = prefix.parse::<u64>().map_err(|_| malformed())?;

        Ok(Self {
            timestamp,
            raw: raw.to_owned(),
        })
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for MigrationName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for MigrationName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
