//! Breakdown table command

use anyhow::{anyhow, Result};
use dashboard_lib::{
    models::{BreakdownTable, FilterSpec, Value},
    pipeline::{self, BreakdownSpec, Reducer, SAVINGS_PCT},
    reports::{self, NamedBreakdown},
    schema::{Domain, SchemaDescriptor},
};

use super::Context;
use crate::output::{
    self, color_savings_pct, format_currency, format_quantity, format_rate, OutputFormat,
};

/// How a breakdown output column is displayed
#[derive(Debug, Clone, Copy, PartialEq)]
enum CellKind {
    Currency,
    Rate,
    Quantity,
}

fn cell_kinds(spec: &BreakdownSpec, schema: &SchemaDescriptor) -> Vec<CellKind> {
    spec.aggregations
        .iter()
        .map(|agg| match &agg.reducer {
            Reducer::Sum(column) | Reducer::Mean(column) | Reducer::First(column)
                if schema.is_cost_column(column) =>
            {
                CellKind::Currency
            }
            Reducer::Sum(column) | Reducer::Mean(column) | Reducer::First(column)
                if schema.is_rate_column(column) =>
            {
                CellKind::Rate
            }
            _ => CellKind::Quantity,
        })
        .collect()
}

fn format_cell(kind: CellKind, value: &Value) -> String {
    match (kind, value) {
        (CellKind::Currency, Value::Number(n)) => format_currency(*n),
        (CellKind::Rate, Value::Number(n)) => format_rate(*n),
        (_, Value::Number(n)) => format_quantity(*n),
        (_, other) => other.to_string(),
    }
}

/// Render a breakdown as header and formatted rows
fn render(table: &BreakdownTable, kinds: &[CellKind]) -> (Vec<String>, Vec<Vec<String>>) {
    let header = table
        .key_columns
        .iter()
        .chain(&table.value_columns)
        .cloned()
        .chain(std::iter::once(SAVINGS_PCT.to_string()))
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            row.keys
                .iter()
                .cloned()
                .chain(
                    row.values
                        .iter()
                        .zip(kinds)
                        .map(|(value, kind)| format_cell(*kind, value)),
                )
                .chain(std::iter::once(color_savings_pct(row.savings_pct)))
                .collect()
        })
        .collect();

    (header, rows)
}

/// Show one standard breakdown of a filtered domain
pub fn show_breakdown(
    ctx: &Context,
    domain: Domain,
    id: &str,
    top: Option<usize>,
    filters: &FilterSpec,
) -> Result<()> {
    let report = reports::find_report(domain, id).ok_or_else(|| {
        let available: Vec<&str> = reports::standard_reports(domain)
            .iter()
            .map(|r| r.id)
            .collect();
        anyhow!(
            "unknown breakdown '{}' for {}; available: {}",
            id,
            domain,
            available.join(", ")
        )
    })?;

    let mut spec = report.spec.clone();
    if let Some(n) = top {
        spec.top_n = Some(spec.top_n.map_or(n, |limit| limit.min(n)));
    }

    let records = ctx.dataset(domain)?;
    let filtered = pipeline::apply_filter(&records, filters);
    let table = pipeline::breakdown(&filtered, &spec);

    match ctx.format {
        OutputFormat::Json => output::print_json(&NamedBreakdown {
            id: report.id.to_string(),
            title: report.title.to_string(),
            table,
        })?,
        OutputFormat::Table => {
            output::print_heading(&format!("{}: {}", domain.schema().title, report.title));
            let (header, rows) = render(&table, &cell_kinds(&spec, domain.schema()));
            output::print_dynamic_table(&header, &rows);
        }
    }

    Ok(())
}
