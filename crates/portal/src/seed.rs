//! 参考数据导入：站点、仪器与产品。
//!
//! 按主键 upsert，重复执行结果一致。只能在迁移全部执行完毕后运行。

use std::collections::HashSet;
use std::path::Path;

use portal_entity::entities::{instrument, product, site};
use portal_migration::{Ledger, MigrationError, Runner};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const DEFAULT_DATASET: &str = include_str!("../fixtures/reference.json");

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("{} migration(s) still pending, run `migrate up` first: {}", .0.len(), .0.join(", "))]
    PendingMigrations(Vec<String>),
    #[error("invalid reference data: {0}")]
    Invalid(String),
    #[error("failed to read reference data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse reference data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSeed {
    pub id: String,
    pub human_readable_name: String,
    #[serde(rename = "type")]
    pub site_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: i32,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub gaw: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSeed {
    pub id: String,
    pub human_readable_name: String,
    #[serde(rename = "type")]
    pub instrument_type: String,
    #[serde(default)]
    pub pid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSeed {
    pub id: String,
    pub human_readable_name: String,
    pub level: String,
    #[serde(default)]
    pub experimental: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub sites: Vec<SiteSeed>,
    #[serde(default)]
    pub instruments: Vec<InstrumentSeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub sites: usize,
    pub instruments: usize,
    pub products: usize,
}

impl Dataset {
    /// 读取参考数据，未指定文件时使用内置数据
    pub fn load(path: Option<&Path>) -> Result<Self, SeedError> {
        let dataset: Dataset = match path {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => serde_json::from_str(DEFAULT_DATASET)?,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    fn validate(&self) -> Result<(), SeedError> {
        ensure_unique("site", self.sites.iter().map(|s| s.id.as_str()))?;
        ensure_unique("instrument", self.instruments.iter().map(|i| i.id.as_str()))?;
        ensure_unique("product", self.products.iter().map(|p| p.id.as_str()))?;

        for site in &self.sites {
            if !(-90.0..=90.0).contains(&site.latitude) || !(-180.0..=180.0).contains(&site.longitude) {
                return Err(SeedError::Invalid(format!(
                    "site {} has coordinates out of range ({}, {})",
                    site.id, site.latitude, site.longitude
                )));
            }
        }
        Ok(())
    }
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), SeedError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(SeedError::Invalid(format!("{kind} with an empty id")));
        }
        if !seen.insert(id) {
            return Err(SeedError::Invalid(format!("duplicate {kind} id {id}")));
        }
    }
    Ok(())
}

impl SiteSeed {
    fn to_active_model(&self) -> site::ActiveModel {
        site::ActiveModel {
            id: Set(self.id.clone()),
            human_readable_name: Set(self.human_readable_name.clone()),
            site_type: Set(self.site_type.clone()),
            latitude: Set(self.latitude),
            longitude: Set(self.longitude),
            altitude: Set(self.altitude),
            country: Set(self.country.clone()),
            gaw: Set(self.gaw.clone()),
        }
    }
}

impl InstrumentSeed {
    fn to_active_model(&self) -> instrument::ActiveModel {
        instrument::ActiveModel {
            id: Set(self.id.clone()),
            human_readable_name: Set(self.human_readable_name.clone()),
            instrument_type: Set(self.instrument_type.clone()),
            pid: Set(self.pid.clone()),
        }
    }
}

impl ProductSeed {
    fn to_active_model(&self) -> product::ActiveModel {
        product::ActiveModel {
            id: Set(self.id.clone()),
            human_readable_name: Set(self.human_readable_name.clone()),
            level: Set(self.level.clone()),
            experimental: Set(self.experimental),
        }
    }
}

/// 在一个事务里导入全部参考数据
pub async fn seed(db: &DatabaseConnection, ledger: &Ledger, dataset: &Dataset) -> Result<SeedReport, SeedError> {
    let pending: Vec<String> = Runner::new(ledger)
        .status(db)
        .await?
        .into_iter()
        .filter(|status| status.in_ledger && status.applied_at.is_none())
        .map(|status| status.name)
        .collect();
    if !pending.is_empty() {
        return Err(SeedError::PendingMigrations(pending));
    }

    let txn = db.begin().await?;
    if !dataset.sites.is_empty() {
        site::Entity::insert_many(dataset.sites.iter().map(SiteSeed::to_active_model))
            .on_conflict(
                OnConflict::column(site::Column::Id)
                    .update_columns([
                        site::Column::HumanReadableName,
                        site::Column::SiteType,
                        site::Column::Latitude,
                        site::Column::Longitude,
                        site::Column::Altitude,
                        site::Column::Country,
                        site::Column::Gaw,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }
    if !dataset.instruments.is_empty() {
        instrument::Entity::insert_many(dataset.instruments.iter().map(InstrumentSeed::to_active_model))
            .on_conflict(
                OnConflict::column(instrument::Column::Id)
                    .update_columns([
                        instrument::Column::HumanReadableName,
                        instrument::Column::InstrumentType,
                        instrument::Column::Pid,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }
    if !dataset.products.is_empty() {
        product::Entity::insert_many(dataset.products.iter().map(ProductSeed::to_active_model))
            .on_conflict(
                OnConflict::column(product::Column::Id)
                    .update_columns([
                        product::Column::HumanReadableName,
                        product::Column::Level,
                        product::Column::Experimental,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    let report = SeedReport {
        sites: dataset.sites.len(),
        instruments: dataset.instruments.len(),
        products: dataset.products.len(),
    };
    info!(
        "参考数据导入完成：站点 {} 个，仪器 {} 个，产品 {} 个",
        report.sites, report.instruments, report.products
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::database::{database_connection, setup_database};

    #[test]
    fn test_builtin_dataset_is_valid() {
        let dataset = Dataset::load(None).unwrap();
        assert!(!dataset.sites.is_empty());
        assert!(!dataset.instruments.is_empty());
        assert!(dataset.products.iter().any(|p| p.id == "categorize" && p.level == "1c"));
        assert!(dataset.products.iter().any(|p| p.experimental));
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_coordinates() {
        let mut dataset = Dataset::load(None).unwrap();
        let first = dataset.sites[0].clone();
        dataset.sites.push(first);
        assert_matches!(dataset.validate(), Err(SeedError::Invalid(msg)) if msg.contains("duplicate site"));

        let mut dataset = Dataset::load(None).unwrap();
        dataset.sites[0].latitude = 123.0;
        assert_matches!(dataset.validate(), Err(SeedError::Invalid(msg)) if msg.contains("out of range"));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let ledger = portal_migration::ledger().unwrap();
        let db = setup_database("sqlite::memory:", &ledger).await.unwrap();
        let dataset = Dataset::load(None).unwrap();

        let report = seed(&db, &ledger, &dataset).await.unwrap();
        assert_eq!(report.sites, dataset.sites.len());
        seed(&db, &ledger, &dataset).await.unwrap();

        assert_eq!(site::Entity::find().count(&db).await.unwrap() as usize, dataset.sites.len());
        assert_eq!(
            instrument::Entity::find().count(&db).await.unwrap() as usize,
            dataset.instruments.len()
        );
        assert_eq!(product::Entity::find().count(&db).await.unwrap() as usize, dataset.products.len());
    }

    #[tokio::test]
    async fn test_seed_updates_existing_rows() {
        let ledger = portal_migration::ledger().unwrap();
        let db = setup_database("sqlite::memory:", &ledger).await.unwrap();
        let mut dataset = Dataset::load(None).unwrap();
        seed(&db, &ledger, &dataset).await.unwrap();

        dataset.sites[0].human_readable_name = "Hyytiälä SMEAR II".to_string();
        dataset.sites[0].gaw = None;
        seed(&db, &ledger, &dataset).await.unwrap();

        let hyytiala = site::Entity::find_by_id(dataset.sites[0].id.clone())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hyytiala.human_readable_name, "Hyytiälä SMEAR II");
        assert_eq!(hyytiala.gaw, None);
    }

    #[tokio::test]
    async fn test_seed_requires_current_schema() {
        let ledger = portal_migration::ledger().unwrap();
        let db = database_connection("sqlite::memory:").await.unwrap();
        let err = seed(&db, &ledger, &Dataset::default()).await.unwrap_err();
        assert_matches!(err, SeedError::PendingMigrations(pending) if pending.len() == ledger.len());
    }
}
