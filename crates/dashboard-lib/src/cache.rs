//! Explicit dataset cache
//!
//! Loaded datasets are memoized per source path:
//! - Within the TTL the cached set is returned without touching disk
//! - After the TTL the source is re-read and its SHA-256 compared; an
//!   unchanged source keeps the parsed set, a changed one is reparsed
//! - Entries are shared read-only behind `Arc`

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::DataLoadError;
use crate::loader;
use crate::models::RecordSet;
use crate::observability::{DashboardMetrics, StructuredLogger};
use crate::schema::{Domain, SchemaDescriptor};

/// Default revalidation interval (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    domain: Domain,
    checksum: String,
    validated_at: Instant,
    records: Arc<RecordSet>,
}

/// Point-in-time view of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
}

/// Cache of parsed datasets keyed by source path
pub struct DatasetCache {
    entries: DashMap<PathBuf, CacheEntry>,
    ttl: Duration,
    metrics: DashboardMetrics,
    logger: StructuredLogger,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_observability(ttl, DashboardMetrics::new(), StructuredLogger::new("costdash"))
    }

    pub fn with_observability(
        ttl: Duration,
        metrics: DashboardMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            metrics,
            logger,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Return the dataset at `path`, loading or revalidating it as needed
    pub fn get_or_load(
        &self,
        path: &Path,
        schema: &'static SchemaDescriptor,
    ) -> Result<Arc<RecordSet>, DataLoadError> {
        let domain = schema.domain.slug();
        let display_path = path.display().to_string();

        if let Some(entry) = self.entries.get(path) {
            if entry.domain == schema.domain && entry.validated_at.elapsed() < self.ttl {
                self.metrics.inc_cache_hits();
                self.logger.log_cache_hit(domain, &display_path);
                return Ok(Arc::clone(&entry.records));
            }
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                self.entries.remove(path);
                self.metrics.inc_load_errors(domain);
                return Err(DataLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let checksum = checksum(&bytes);

        if let Some(mut entry) = self.entries.get_mut(path) {
            if entry.domain == schema.domain && entry.checksum == checksum {
                entry.validated_at = Instant::now();
                self.metrics.inc_cache_hits();
                self.logger.log_cache_refreshed(domain, &display_path, false);
                return Ok(Arc::clone(&entry.records));
            }
        }

        self.metrics.inc_cache_misses();
        let start = Instant::now();
        let parsed = loader::load(bytes.as_slice(), schema);
        self.metrics.observe_load_latency(start.elapsed().as_secs_f64());

        let records = match parsed {
            Ok(records) => Arc::new(records),
            Err(e) => {
                self.entries.remove(path);
                self.metrics.inc_load_errors(domain);
                return Err(e);
            }
        };

        let replaced = self
            .entries
            .insert(
                path.to_path_buf(),
                CacheEntry {
                    domain: schema.domain,
                    checksum: checksum.clone(),
                    validated_at: Instant::now(),
                    records: Arc::clone(&records),
                },
            )
            .is_some();

        if replaced {
            self.logger.log_cache_refreshed(domain, &display_path, true);
        }
        self.metrics.set_rows_loaded(domain, records.len() as i64);
        self.logger
            .log_dataset_loaded(domain, &display_path, records.len(), &checksum);

        Ok(records)
    }

    /// Drop one source so the next request reparses it
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
        }
    }
}

/// SHA-256 of a source, hex encoded
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::KUBERNETES;
    use tempfile::TempDir;

    const CSV_V1: &str = "cluster_name,current_cost,target_cost,savings\nc1,10,4,6\n";
    const CSV_V2: &str = "cluster_name,current_cost,target_cost,savings\nc1,10,4,6\nc2,20,5,15\n";

    fn write(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("rightsizing_results.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_cache_returns_shared_set_within_ttl() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, CSV_V1);
        let cache = DatasetCache::new(Duration::from_secs(60));

        let first = cache.get_or_load(&path, &KUBERNETES).unwrap();
        // Changes on disk are not seen until the TTL expires.
        write(&dir, CSV_V2);
        let second = cache.get_or_load(&path, &KUBERNETES).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_expired_entry_with_same_checksum_is_reused() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, CSV_V1);
        let cache = DatasetCache::new(Duration::ZERO);

        let first = cache.get_or_load(&path, &KUBERNETES).unwrap();
        let second = cache.get_or_load(&path, &KUBERNETES).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_expired_entry_with_new_content_is_reparsed() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, CSV_V1);
        let cache = DatasetCache::new(Duration::ZERO);

        let first = cache.get_or_load(&path, &KUBERNETES).unwrap();
        write(&dir, CSV_V2);
        let second = cache.get_or_load(&path, &KUBERNETES).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, CSV_V1);
        let cache = DatasetCache::new(Duration::from_secs(60));

        cache.get_or_load(&path, &KUBERNETES).unwrap();
        write(&dir, CSV_V2);
        assert!(cache.invalidate(&path));
        assert_eq!(cache.get_or_load(&path, &KUBERNETES).unwrap().len(), 2);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "cluster_name,current_cost\nc1,10\n");
        let cache = DatasetCache::new(Duration::from_secs(60));

        assert!(cache.get_or_load(&path, &KUBERNETES).is_err());
        assert_eq!(cache.stats().entries, 0);

        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            cache.get_or_load(&missing, &KUBERNETES),
            Err(DataLoadError::Io { .. })
        ));
    }

    #[test]
    fn test_checksum_is_stable() {
        assert_eq!(checksum(b"abc"), checksum(b"abc"));
        assert_ne!(checksum(b"abc"), checksum(b"abd"));
        assert_eq!(checksum(b"").len(), 64);
    }
}
