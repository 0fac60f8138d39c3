//! Cost optimization dashboard library
//!
//! This crate provides the core functionality for:
//! - Loading rightsizing recommendation tables per domain
//! - Filtering, summarizing and breaking down recommendations
//! - Standard per-domain reports and filtered-data export
//! - Dataset caching, availability tracking and observability

pub mod cache;
pub mod catalog;
pub mod error;
pub mod export;
pub mod loader;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod reports;
pub mod schema;

pub use cache::{CacheStats, DatasetCache};
pub use catalog::{CatalogHealth, CatalogStatus, DataCatalog, DomainHealth, DomainStatus};
pub use error::DataLoadError;
pub use export::{ExportTable, RecordQuery, RecordTable};
pub use models::*;
pub use observability::{DashboardMetrics, StructuredLogger};
pub use reports::{DashboardView, KeyInsights, NamedBreakdown};
pub use schema::{Domain, SchemaDescriptor};
