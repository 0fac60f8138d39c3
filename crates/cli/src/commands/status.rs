//! Domain availability and filter option commands

use anyhow::Result;
use colored::Colorize;
use dashboard_lib::{catalog::DomainStatus, pipeline, schema::Domain};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

use super::Context;
use crate::output::{self, color_status, OutputFormat};

/// Row for the domain status table
#[derive(Tabled)]
struct DomainStatusRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Details")]
    details: String,
    #[tabled(rename = "Checked")]
    checked: String,
}

/// Load every domain and show which ones can be served
pub fn show_status(ctx: &Context) -> Result<()> {
    let health = ctx.catalog.refresh_all();

    match ctx.format {
        OutputFormat::Json => output::print_json(&health)?,
        OutputFormat::Table => {
            output::print_heading("Dashboard Data Status");
            output::print_field("Data directory", ctx.catalog.data_dir().display());
            output::print_field("Overall", color_status(&format!("{:?}", health.status)));
            println!();

            let rows: Vec<DomainStatusRow> = health
                .domains
                .iter()
                .map(|(domain, h)| {
                    let schema = domain.schema();
                    let (state, details) = match &h.status {
                        DomainStatus::Unknown => ("unknown", String::new()),
                        DomainStatus::Available { rows } => ("available", format!("{} rows", rows)),
                        DomainStatus::Unavailable { reason } => ("unavailable", reason.clone()),
                    };
                    DomainStatusRow {
                        domain: domain.slug().to_string(),
                        title: schema.title.to_string(),
                        file: schema.file_name.to_string(),
                        status: color_status(state),
                        details,
                        checked: format_timestamp(h.last_check_timestamp),
                    }
                })
                .collect();
            output::print_table(&rows);

            let unavailable = health
                .domains
                .values()
                .filter(|h| !h.status.is_available())
                .count();
            if unavailable > 0 {
                println!();
                output::print_warning(&format!(
                    "{} domain(s) unavailable; their views are disabled",
                    unavailable
                ));
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct FilterOptions {
    domain: Domain,
    filters: BTreeMap<String, Vec<String>>,
}

/// List the selectable values of each filter column
pub fn show_filters(ctx: &Context, domain: Domain) -> Result<()> {
    let records = ctx.dataset(domain)?;
    let filters: BTreeMap<String, Vec<String>> = domain
        .schema()
        .filter_columns
        .iter()
        .map(|column| (column.to_string(), pipeline::distinct_values(&records, column)))
        .collect();

    match ctx.format {
        OutputFormat::Json => output::print_json(&FilterOptions { domain, filters })?,
        OutputFormat::Table => {
            output::print_heading(&format!("{} Filters", domain.schema().title));
            for (column, values) in &filters {
                println!("{}", column.cyan().bold());
                for value in values {
                    println!("  {}", value);
                }
            }
        }
    }

    Ok(())
}

/// Format a unix timestamp for display
fn format_timestamp(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}
