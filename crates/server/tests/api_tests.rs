//! Integration tests for the dashboard API endpoints

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use dashboard_lib::{
    cache::DatasetCache,
    catalog::DataCatalog,
    observability::{DashboardMetrics, StructuredLogger},
};
use dashboard_server::api::{create_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const KUBERNETES_CSV: &str = "\
cluster_name,project_id,region,current_machine_type,target_machine_type,node_count,current_cost,target_cost,savings
gke-prod,shop,us-east1,n1-standard-8,e2-standard-4,6,1200,700,500
gke-batch,shop,us-east1,n1-standard-4,e2-standard-4,3,300,200,100
gke-eu,analytics,europe-west1,n1-standard-8,n2-standard-4,10,2000,1800,200
";

const OVERVIEW_CSV: &str = "\
service,project_id,Actual,Estimated,Savings
compute,shop,1500,900,600
cloudsql,analytics,400,300,100
";

fn write_data(dir: &TempDir) {
    std::fs::write(dir.path().join("rightsizing_results.csv"), KUBERNETES_CSV).unwrap();
    std::fs::write(dir.path().join("overview.csv"), OVERVIEW_CSV).unwrap();
    // Missing cost columns
    std::fs::write(
        dir.path().join("rightsizing_results_cloudsql.csv"),
        "resource_name,project_id\ndb-1,shop\n",
    )
    .unwrap();
}

fn setup_test_app(dir: &TempDir) -> Router {
    let metrics = DashboardMetrics::new();
    let logger = StructuredLogger::new("api-test");
    let cache = Arc::new(DatasetCache::with_observability(
        Duration::from_secs(60),
        metrics.clone(),
        logger.clone(),
    ));
    let catalog = DataCatalog::new(dir.path(), cache);
    create_router(Arc::new(AppState::new(catalog, metrics, logger)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_healthz_returns_503_before_any_load() {
    let dir = TempDir::new().unwrap();
    let app = setup_test_app(&dir);

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["domains"]["overview"]["state"], "unknown");
}

#[tokio::test]
async fn test_healthz_degraded_after_partial_load() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (status, _) = get_json(app.clone(), "/api/v1/kubernetes/view").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(app.clone(), "/api/v1/cloudsql/view").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, health) = get_json(app.clone(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["domains"]["kubernetes"]["state"], "available");
    assert_eq!(health["domains"]["kubernetes"]["rows"], 3);
    assert_eq!(health["domains"]["cloudsql"]["state"], "unavailable");

    let (status, readiness) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
    assert_eq!(readiness["available_domains"], serde_json::json!(["kubernetes"]));
}

#[tokio::test]
async fn test_readyz_returns_503_without_data() {
    let dir = TempDir::new().unwrap();
    let app = setup_test_app(&dir);

    let (status, _) = get_json(app.clone(), "/api/v1/dataflow/view").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, readiness) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_unknown_domain_is_404() {
    let dir = TempDir::new().unwrap();
    let app = setup_test_app(&dir);

    let (status, body) = get_json(app, "/api/v1/bigquery/view").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("bigquery"));
}

#[tokio::test]
async fn test_unavailable_domain_reports_reason() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (status, body) = get_json(app, "/api/v1/cloudsql/filters").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("current_cost"));
}

#[tokio::test]
async fn test_domains_listing() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (_, _) = get_json(app.clone(), "/api/v1/overview/view").await;
    let (status, body) = get_json(app, "/api/v1/domains").await;

    assert_eq!(status, StatusCode::OK);
    let domains = body.as_array().unwrap();
    assert_eq!(domains.len(), 4);
    assert_eq!(domains[0]["domain"], "overview");
    assert_eq!(domains[0]["file_name"], "overview.csv");
    assert_eq!(domains[0]["state"], "available");
}

#[tokio::test]
async fn test_filter_options_start_with_all() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (status, body) = get_json(app, "/api/v1/kubernetes/filters").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["filters"]["region"],
        serde_json::json!(["All", "europe-west1", "us-east1"])
    );
    assert_eq!(
        body["filters"]["target_machine_type"],
        serde_json::json!(["All", "e2-standard-4", "n2-standard-4"])
    );
}

#[tokio::test]
async fn test_view_applies_filters() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (status, view) = get_json(app, "/api/v1/kubernetes/view?region=us-east1&project_id=All").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["summary"]["row_count"], 2);
    assert_eq!(view["summary"]["total_savings"], 600.0);
    assert_eq!(view["summary"]["total_nodes"], 9.0);
    assert_eq!(view["insights"]["top_opportunity"]["key"], "gke-prod");

    let breakdowns = view["breakdowns"].as_array().unwrap();
    assert!(breakdowns.iter().any(|b| b["id"] == "nodes"));
}

#[tokio::test]
async fn test_records_search_and_columns() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (status, body) =
        get_json(app, "/api/v1/kubernetes/records?search=GKE-E&columns=cluster_name,savings").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], serde_json::json!(["cluster_name", "savings"]));
    assert_eq!(body["rows"], serde_json::json!([["gke-eu", 200.0]]));
}

#[tokio::test]
async fn test_export_is_csv_attachment() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (status, headers, body) = get(app, "/api/v1/overview/export?service=compute").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"overview_filtered_data.csv\""
    );

    let text = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "service,project_id,Actual,Estimated,Savings,Savings %");
    assert_eq!(lines[1], "compute,shop,\"$1,500.00\",$900.00,$600.00,40.00%");
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let dir = TempDir::new().unwrap();
    write_data(&dir);
    let app = setup_test_app(&dir);

    let (_, _) = get_json(app.clone(), "/api/v1/kubernetes/view").await;
    let (status, headers, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .contains("text/plain"));

    let metrics_text = String::from_utf8(body).unwrap();
    assert!(metrics_text.contains("costdash_load_latency_seconds_bucket"));
    assert!(metrics_text.contains("costdash_rows_loaded"));
    assert!(metrics_text.contains("costdash_views_rendered_total"));
}
