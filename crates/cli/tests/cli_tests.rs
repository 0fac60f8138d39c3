//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const DATAFLOW_CSV: &str = "\
job_name,project_id,region,current_machine_type,target_machine_type,current_machine_hourly_rate,target_machine_hourly_rate,current_cost,target_cost,savings
etl-daily,analytics,us-central1,n1-standard-8,n2-standard-4,0.38,0.19,1200,600,600
etl-hourly,analytics,us-central1,n1-standard-4,e2-standard-4,0.19,0.134,400,300,100
stream-ingest,ingest,europe-west1,n1-standard-8,n2-standard-4,0.38,0.19,800,500,300
";

/// Run the built binary with an isolated home directory and no colors
fn costdash(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_costdash"))
        .args(args)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("COSTDASH_DATA_DIR")
        .output()
        .expect("Failed to execute command")
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rightsizing_results_dataflow.csv"), DATAFLOW_CSV).unwrap();
    dir
}

fn with_data_dir<'a>(dir: &'a TempDir, args: &[&'a str]) -> Vec<&'a str> {
    let mut full = vec!["--data-dir", dir.path().to_str().unwrap()];
    full.extend_from_slice(args);
    full
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = costdash(home.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("cost optimization"), "Should describe the tool");
    for command in ["status", "filters", "summary", "breakdown", "records", "export"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("COSTDASH_DATA_DIR"), "Should show env var");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = costdash(home.path(), &["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("costdash"), "Should show binary name");
}

/// Test filter flags appear on the summary command
#[test]
fn test_summary_help_lists_filters() {
    let home = TempDir::new().unwrap();
    let output = costdash(home.path(), &["summary", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in ["--region", "--project", "--current-machine", "--target-machine", "--service"] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let home = TempDir::new().unwrap();
    let output = costdash(home.path(), &["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should show error message");
}

#[test]
fn test_unknown_domain_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = costdash(home.path(), &["summary", "bigquery"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown domain"));
}

#[test]
fn test_status_reports_each_domain() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let output = costdash(home.path(), &with_data_dir(&dir, &["--format", "json", "status"]));

    assert!(output.status.success());
    let health: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["domains"]["dataflow"]["state"], "available");
    assert_eq!(health["domains"]["dataflow"]["rows"], 3);
    assert_eq!(health["domains"]["kubernetes"]["state"], "unavailable");
}

#[test]
fn test_summary_json_with_filter() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let output = costdash(
        home.path(),
        &with_data_dir(&dir, &["-f", "json", "summary", "dataflow", "--region", "us-central1"]),
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["summary"]["row_count"], 2);
    assert_eq!(body["summary"]["total_savings"], 700.0);
    assert_eq!(body["summary"]["annual_savings"], 8400.0);
    assert_eq!(body["filters"]["selections"]["region"], "us-central1");
}

#[test]
fn test_summary_table_output() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let output = costdash(home.path(), &with_data_dir(&dir, &["summary", "dataflow"]));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DataFlow Cost Optimization"));
    assert!(stdout.contains("$2,400.00"));
    assert!(stdout.contains("Hourly Rates"));
}

#[test]
fn test_filter_flag_outside_domain_fails() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let output = costdash(
        home.path(),
        &with_data_dir(&dir, &["summary", "dataflow", "--service", "compute"]),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--service does not apply"));
}

#[test]
fn test_breakdown_json_sorted_by_savings() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let output = costdash(
        home.path(),
        &with_data_dir(&dir, &["--format", "json", "breakdown", "dataflow", "--by", "region"]),
    );

    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["id"], "region");
    assert_eq!(body["table"]["rows"][0]["keys"], serde_json::json!(["us-central1"]));
    assert_eq!(body["table"]["rows"][1]["keys"], serde_json::json!(["europe-west1"]));
}

#[test]
fn test_unknown_breakdown_lists_available() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let output = costdash(
        home.path(),
        &with_data_dir(&dir, &["breakdown", "dataflow", "--by", "nope"]),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("migration"));
}

#[test]
fn test_missing_domain_file_fails_with_path() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let output = costdash(home.path(), &with_data_dir(&dir, &["summary", "kubernetes"]));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rightsizing_results.csv"));
}

#[test]
fn test_export_writes_csv() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let target = dir.path().join("out.csv");
    let output = costdash(
        home.path(),
        &with_data_dir(
            &dir,
            &[
                "export",
                "dataflow",
                "--search",
                "ETL",
                "--columns",
                "job_name,current_cost,savings",
                "--output",
                target.to_str().unwrap(),
            ],
        ),
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let csv = std::fs::read_to_string(&target).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "job_name,current_cost,savings,Savings %");
    assert_eq!(lines[1], "etl-daily,\"$1,200.00\",$600.00,50.00%");
    assert_eq!(lines[2], "etl-hourly,$400.00,$100.00,25.00%");
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_config_file_supplies_data_dir() {
    let home = TempDir::new().unwrap();
    let dir = data_dir();
    let config_dir = home.path().join(".config").join("costdash");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.json"),
        serde_json::json!({
            "data_dir": dir.path(),
            "default_format": "json",
        })
        .to_string(),
    )
    .unwrap();

    let output = costdash(home.path(), &["records", "dataflow", "--search", "stream"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
}
