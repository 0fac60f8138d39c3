//! CLI command implementations

pub mod breakdown;
pub mod records;
pub mod status;
pub mod summary;

use anyhow::{Context as _, Result};
use dashboard_lib::{
    cache::DatasetCache, catalog::DataCatalog, models::RecordSet, schema::Domain,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::output::OutputFormat;

/// Shared state of one CLI invocation
pub struct Context {
    pub catalog: DataCatalog,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(data_dir: PathBuf, format: OutputFormat) -> Self {
        let cache = Arc::new(DatasetCache::default());
        Self {
            catalog: DataCatalog::new(data_dir, cache),
            format,
        }
    }

    /// Load a domain's dataset or explain which file is at fault
    pub fn dataset(&self, domain: Domain) -> Result<Arc<RecordSet>> {
        let path = self.catalog.path_for(domain);
        self.catalog
            .dataset(domain)
            .with_context(|| format!("{} data unavailable ({})", domain, path.display()))
    }
}
