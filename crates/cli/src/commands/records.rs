//! Record listing and CSV export commands

use anyhow::{Context as _, Result};
use dashboard_lib::{
    export::{self, RecordQuery},
    models::FilterSpec,
    observability::StructuredLogger,
    schema::Domain,
};
use std::path::PathBuf;

use super::Context;
use crate::output::{self, OutputFormat};

/// Record query from CLI flags; empty search and column lists mean "not set"
pub fn build_query(filters: FilterSpec, search: Option<String>, columns: Vec<String>) -> RecordQuery {
    let mut query = RecordQuery::new(filters);
    if let Some(term) = search.filter(|t| !t.is_empty()) {
        query = query.search(term);
    }
    let columns: Vec<String> = columns
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if !columns.is_empty() {
        query = query.columns(columns);
    }
    query
}

/// Print matching records, formatted as in the export
pub fn show_records(ctx: &Context, domain: Domain, query: &RecordQuery, limit: usize) -> Result<()> {
    let records = ctx.dataset(domain)?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&export::record_table(&records, query))?,
        OutputFormat::Table => {
            let table = export::export_table(&records, query);
            output::print_heading(&format!("{} Records", domain.schema().title));
            let shown = table.len().min(limit);
            output::print_dynamic_table(&table.columns, &table.rows[..shown]);
            if shown < table.len() {
                output::print_info(&format!(
                    "Showing {} of {} records (use --limit to see more)",
                    shown,
                    table.len()
                ));
            }
        }
    }

    Ok(())
}

/// Write matching records to a CSV file
pub fn export_records(
    ctx: &Context,
    domain: Domain,
    query: &RecordQuery,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let records = ctx.dataset(domain)?;
    let table = export::export_table(&records, query);
    let path = output_path.unwrap_or_else(|| PathBuf::from(&table.file_name));

    let bytes = table.to_csv_bytes().context("Failed to encode export")?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write export file {}", path.display()))?;

    StructuredLogger::new("costdash-cli").log_export(
        domain.slug(),
        &path.display().to_string(),
        table.len(),
    );

    match ctx.format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "domain": domain,
            "path": path,
            "rows": table.len(),
            "columns": table.columns,
        }))?,
        OutputFormat::Table => output::print_success(&format!(
            "Exported {} {} records to {}",
            table.len(),
            domain,
            path.display()
        )),
    }

    Ok(())
}
