//! Dataset catalog and per-domain availability tracking
//!
//! Each domain loads independently: a missing or malformed source marks that
//! domain unavailable while the others keep serving.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::cache::DatasetCache;
use crate::error::DataLoadError;
use crate::models::RecordSet;
use crate::schema::Domain;

/// Availability of one domain's dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DomainStatus {
    /// Not requested yet
    Unknown,
    Available { rows: usize },
    Unavailable { reason: String },
}

impl DomainStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, DomainStatus::Available { .. })
    }
}

/// Status of a domain plus when it was last checked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainHealth {
    #[serde(flatten)]
    pub status: DomainStatus,
    pub last_check_timestamp: i64,
}

impl DomainHealth {
    fn now(status: DomainStatus) -> Self {
        Self {
            status,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Overall catalog status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    /// Every domain available
    Healthy,
    /// Some domains unavailable
    Degraded,
    /// No domain available
    Unhealthy,
}

/// Health response over all domains
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogHealth {
    pub status: CatalogStatus,
    pub domains: BTreeMap<Domain, DomainHealth>,
}

impl CatalogHealth {
    /// Compute overall status from domain statuses
    pub fn compute_status(domains: &BTreeMap<Domain, DomainHealth>) -> CatalogStatus {
        let available = domains.values().filter(|d| d.status.is_available()).count();
        if available == 0 {
            CatalogStatus::Unhealthy
        } else if available == domains.len() {
            CatalogStatus::Healthy
        } else {
            CatalogStatus::Degraded
        }
    }
}

/// The four domain datasets living in one data directory
#[derive(Clone)]
pub struct DataCatalog {
    data_dir: PathBuf,
    cache: Arc<DatasetCache>,
    statuses: Arc<RwLock<BTreeMap<Domain, DomainHealth>>>,
}

impl DataCatalog {
    pub fn new(data_dir: impl Into<PathBuf>, cache: Arc<DatasetCache>) -> Self {
        let statuses = Domain::ALL
            .iter()
            .map(|d| (*d, DomainHealth::now(DomainStatus::Unknown)))
            .collect();
        Self {
            data_dir: data_dir.into(),
            cache,
            statuses: Arc::new(RwLock::new(statuses)),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Source file of a domain
    pub fn path_for(&self, domain: Domain) -> PathBuf {
        self.data_dir.join(domain.schema().file_name)
    }

    /// Load (or reuse) a domain's dataset, recording its availability
    pub fn dataset(&self, domain: Domain) -> Result<Arc<RecordSet>, DataLoadError> {
        let path = self.path_for(domain);
        let result = self.cache.get_or_load(&path, domain.schema());

        let status = match &result {
            Ok(records) => DomainStatus::Available {
                rows: records.len(),
            },
            Err(e) => {
                self.cache.logger().log_dataset_unavailable(
                    domain.slug(),
                    &path.display().to_string(),
                    &e.to_string(),
                );
                DomainStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
        };
        self.record(domain, status);

        result
    }

    /// Load every domain; failures never stop the remaining domains
    pub fn refresh_all(&self) -> CatalogHealth {
        for domain in Domain::ALL {
            let _ = self.dataset(domain);
        }
        self.health()
    }

    pub fn status(&self, domain: Domain) -> DomainStatus {
        self.statuses
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&domain)
            .map(|h| h.status.clone())
            .unwrap_or(DomainStatus::Unknown)
    }

    pub fn health(&self) -> CatalogHealth {
        let domains = self
            .statuses
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        CatalogHealth {
            status: CatalogHealth::compute_status(&domains),
            domains,
        }
    }

    /// Ready once at least one domain can be served
    pub fn is_ready(&self) -> bool {
        self.health().status != CatalogStatus::Unhealthy
    }

    fn record(&self, domain: Domain, status: DomainStatus) {
        let mut statuses = self
            .statuses
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        statuses.insert(domain, DomainHealth::now(status));
    }
}
