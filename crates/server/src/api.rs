//! HTTP API for dashboard views, exports, health checks and Prometheus metrics

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashboard_lib::{
    catalog::{CatalogStatus, DataCatalog, DomainHealth},
    export::{self, RecordQuery, RecordTable},
    models::{FilterSpec, RecordSet},
    observability::{DashboardMetrics, StructuredLogger},
    pipeline,
    reports::{self, DashboardView},
    schema::Domain,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Query parameters that are not column filters
const SEARCH_PARAM: &str = "search";
const COLUMNS_PARAM: &str = "columns";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: DataCatalog,
    pub metrics: DashboardMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(catalog: DataCatalog, metrics: DashboardMetrics, logger: StructuredLogger) -> Self {
        Self {
            catalog,
            metrics,
            logger,
        }
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),

    #[error("{domain} data unavailable: {reason}")]
    Unavailable { domain: Domain, reason: String },

    #[error("export failed: {0}")]
    Export(String),

    #[error("{domain} load task failed: {reason}")]
    LoadTask { domain: Domain, reason: String },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnknownDomain(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Export(_) | ApiError::LoadTask { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// One entry of the domain listing
#[derive(Debug, Serialize)]
pub struct DomainEntry {
    pub domain: Domain,
    pub title: &'static str,
    pub file_name: &'static str,
    #[serde(flatten)]
    pub health: DomainHealth,
}

/// Filter options of a domain, `All` first
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub domain: Domain,
    pub filters: BTreeMap<String, Vec<String>>,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub available_domains: Vec<Domain>,
    pub timestamp: i64,
}

fn parse_domain(raw: &str) -> Result<Domain, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::UnknownDomain(raw.to_string()))
}

/// Fetch a dataset off the async workers; a cache miss reads and parses the file
async fn load(state: &AppState, domain: Domain) -> Result<Arc<RecordSet>, ApiError> {
    let catalog = state.catalog.clone();
    tokio::task::spawn_blocking(move || catalog.dataset(domain))
        .await
        .map_err(|e| ApiError::LoadTask {
            domain,
            reason: e.to_string(),
        })?
        .map_err(|e| ApiError::Unavailable {
            domain,
            reason: e.to_string(),
        })
}

/// Build filter selections from query parameters naming the domain's filter columns
pub fn filters_from_params(domain: Domain, params: &HashMap<String, String>) -> FilterSpec {
    let mut spec = FilterSpec::new();
    for column in domain.schema().filter_columns {
        if let Some(value) = params.get(*column) {
            spec.set(*column, value.as_str());
        }
    }
    spec
}

/// Record query from filter, `search` and comma separated `columns` parameters
pub fn record_query_from_params(domain: Domain, params: &HashMap<String, String>) -> RecordQuery {
    let mut query = RecordQuery::new(filters_from_params(domain, params));
    if let Some(term) = params.get(SEARCH_PARAM).filter(|t| !t.is_empty()) {
        query = query.search(term.as_str());
    }
    if let Some(columns) = params.get(COLUMNS_PARAM) {
        let columns: Vec<&str> = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if !columns.is_empty() {
            query = query.columns(columns);
        }
    }
    query
}

/// Health check response - returns 200 while any domain is served, 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.catalog.health();

    let status_code = match health.status {
        CatalogStatus::Healthy => StatusCode::OK,
        CatalogStatus::Degraded => StatusCode::OK, // Remaining domains still served
        CatalogStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.catalog.health();
    let readiness = ReadinessResponse {
        ready: health.status != CatalogStatus::Unhealthy,
        available_domains: health
            .domains
            .iter()
            .filter(|(_, h)| h.status.is_available())
            .map(|(d, _)| *d)
            .collect(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn list_domains(State(state): State<Arc<AppState>>) -> Json<Vec<DomainEntry>> {
    let health = state.catalog.health();
    let entries = health
        .domains
        .into_iter()
        .map(|(domain, health)| {
            let schema = domain.schema();
            DomainEntry {
                domain,
                title: schema.title,
                file_name: schema.file_name,
                health,
            }
        })
        .collect();
    Json(entries)
}

async fn filter_options(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<FilterOptions>, ApiError> {
    let domain = parse_domain(&raw)?;
    let records = load(&state, domain).await?;

    let filters = domain
        .schema()
        .filter_columns
        .iter()
        .map(|column| {
            (
                column.to_string(),
                pipeline::distinct_values(&records, column),
            )
        })
        .collect();

    Ok(Json(FilterOptions { domain, filters }))
}

async fn domain_view(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DashboardView>, ApiError> {
    let domain = parse_domain(&raw)?;
    let records = load(&state, domain).await?;
    let filters = filters_from_params(domain, &params);

    let view = reports::dashboard_view(&records, &filters);
    state.metrics.inc_views_rendered(domain.slug());
    debug!(domain = %domain, rows = view.summary.row_count, "Rendered dashboard view");

    Ok(Json(view))
}

async fn domain_records(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RecordTable>, ApiError> {
    let domain = parse_domain(&raw)?;
    let records = load(&state, domain).await?;
    let query = record_query_from_params(domain, &params);

    Ok(Json(export::record_table(&records, &query)))
}

async fn domain_export(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let domain = parse_domain(&raw)?;
    let records = load(&state, domain).await?;
    let query = record_query_from_params(domain, &params);

    let table = export::export_table(&records, &query);
    let bytes = table
        .to_csv_bytes()
        .map_err(|e| ApiError::Export(e.to_string()))?;

    state.metrics.inc_exports_generated(domain.slug());
    state
        .logger
        .log_export(domain.slug(), &table.file_name, table.len());

    let disposition = format!("attachment; filename=\"{}\"", table.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/domains", get(list_domains))
        .route("/api/v1/:domain/filters", get(filter_options))
        .route("/api/v1/:domain/view", get(domain_view))
        .route("/api/v1/:domain/records", get(domain_records))
        .route("/api/v1/:domain/export", get(domain_export))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
