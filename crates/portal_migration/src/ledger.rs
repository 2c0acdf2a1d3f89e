use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{ConsistencyWarning, LedgerError};
use crate::name::MigrationName;
use crate::record::MigrationRecord;

#[derive(Debug, Clone)]
struct Entry {
    name: MigrationName,
    record: MigrationRecord,
}

/// 全部已知迁移的有序台账，按名称中的时间戳升序排列
#[derive(Debug, Clone)]
pub struct Ledger {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Ledger {
    pub fn new(records: impl IntoIterator<Item = MigrationRecord>) -> Result<Self, LedgerError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            if !seen.insert(record.name().to_owned()) {
                return Err(LedgerError::DuplicateName(record.name().to_owned()));
            }
            let name = MigrationName::parse(record.name())?;
            entries.push(Entry { name, record });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].name.timestamp() == pair[1].name.timestamp())
        {
            return Err(LedgerError::DuplicateTimestamp {
                timestamp: pair[0].name.timestamp(),
                first: pair[0].name.to_string(),
                second: pair[1].name.to_string(),
            });
        }

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.to_string(), i))
            .collect();
        Ok(Self { entries, index })
    }

    pub fn all(&self) -> impl DoubleEndedIterator<Item = &MigrationRecord> + ExactSizeIterator {
        self.entries.iter().map(|entry| &entry.record)
    }

    /// 尚未应用的迁移，保持台账顺序
    pub fn pending(&self, applied: &HashSet<String>) -> Vec<&MigrationRecord> {
        self.all()
            .filter(|record| !applied.contains(record.name()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&MigrationRecord> {
        self.position(name).map(|i| &self.entries[i].record)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn latest(&self) -> Option<&MigrationRecord> {
        self.entries.last().map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 对比已应用集合与台账，找出孤立记录和顺序缺口
    pub fn consistency(&self, applied: &HashSet<String>) -> ConsistencyReport {
        let mut warnings = Vec::new();

        let mut orphans: Vec<&String> = applied
            .iter()
            .filter(|name| !self.index.contains_key(name.as_str()))
            .collect();
        // 无法解析的名称排在最后
        orphans.sort_by_cached_key(|name| {
            let timestamp = MigrationName::parse(name).map_or(u64::MAX, |parsed| parsed.timestamp());
            (timestamp, name.to_string())
        });
        warnings.extend(
            orphans
                .into_iter()
                .map(|name| ConsistencyWarning::Orphaned { name: name.clone() }),
        );

        // 从后往前扫描，记住目前见到的最早一个已应用迁移
        let mut applied_after: Option<&str> = None;
        let mut gaps = Vec::new();
        for entry in self.entries.iter().rev() {
            let name = entry.record.name();
            if applied.contains(name) {
                applied_after = Some(name);
            } else if let Some(later) = applied_after {
                gaps.push(ConsistencyWarning::OutOfOrder {
                    pending: name.to_owned(),
                    applied_after: later.to_owned(),
                });
            }
        }
        gaps.reverse();
        warnings.extend(gaps);

        ConsistencyReport { warnings }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub warnings: Vec<ConsistencyWarning>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.warnings.is_empty()
    }
}
