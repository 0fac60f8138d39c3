//! Record view and filtered-data export
//!
//! Rows are filtered, searched over the domain's search columns and cut down
//! to the selected columns. The export form adds a `Savings %` column and
//! formats money, percentages and hourly rates for humans.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{FilterSpec, RecordSet, Row, Value};
use crate::pipeline::{self, percentage, SAVINGS_PCT};
use crate::schema::{Domain, SchemaDescriptor};

/// Row selection for the record view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    #[serde(default)]
    pub filters: FilterSpec,
    #[serde(default)]
    pub search: Option<String>,
    /// Columns to show; `None` selects the domain defaults
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl RecordQuery {
    pub fn new(filters: FilterSpec) -> Self {
        Self {
            filters,
            search: None,
            columns: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Typed rows of the record view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    pub domain: Domain,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Formatted rows ready to be written as CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTable {
    pub file_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Filter then search, keeping every column
pub fn matching_rows(records: &RecordSet, query: &RecordQuery) -> RecordSet {
    let filtered = pipeline::apply_filter(records, &query.filters);
    match query.search.as_deref() {
        Some(term) => pipeline::full_text_search(&filtered, term, records.schema().search_columns),
        None => filtered,
    }
}

/// Requested columns that exist, in request order.
///
/// Without a request the domain defaults are used; when none of those exist
/// either, every column is shown.
pub fn selected_columns(records: &RecordSet, requested: Option<&[String]>) -> Vec<String> {
    let present = |c: &&str| records.has_column(c);
    let chosen: Vec<String> = match requested {
        Some(columns) => columns
            .iter()
            .map(String::as_str)
            .filter(present)
            .map(str::to_string)
            .collect(),
        None => records
            .schema()
            .default_columns
            .iter()
            .copied()
            .filter(present)
            .map(str::to_string)
            .collect(),
    };

    if chosen.is_empty() {
        records.columns().to_vec()
    } else {
        chosen
    }
}

/// Typed record view
pub fn record_table(records: &RecordSet, query: &RecordQuery) -> RecordTable {
    let rows = matching_rows(records, query);
    let columns = selected_columns(records, query.columns.as_deref());
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|c| records.column_index(c))
        .collect();

    RecordTable {
        domain: records.schema().domain,
        columns,
        rows: rows
            .rows()
            .iter()
            .map(|row| indices.iter().map(|&i| row.get(i).clone()).collect())
            .collect(),
    }
}

/// Formatted export of the record view
pub fn export_table(records: &RecordSet, query: &RecordQuery) -> ExportTable {
    let schema = records.schema();
    let rows = matching_rows(records, query);
    let mut columns = selected_columns(records, query.columns.as_deref());
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|c| records.column_index(c))
        .collect();

    let savings_position = columns.iter().position(|c| c == schema.savings);
    let with_pct = savings_position.is_some() && columns.iter().any(|c| c == schema.current_cost);
    let current_idx = records.column_index(schema.current_cost);
    let savings_idx = records.column_index(schema.savings);

    let formatted: Vec<Vec<String>> = rows
        .rows()
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = columns
                .iter()
                .zip(&indices)
                .map(|(column, &i)| format_cell(schema, column, row.get(i)))
                .collect();
            if let (true, Some(position)) = (with_pct, savings_position) {
                let pct = row_savings_pct(row, current_idx, savings_idx);
                cells.insert(position + 1, format_percent(pct));
            }
            cells
        })
        .collect();

    if let (true, Some(position)) = (with_pct, savings_position) {
        columns.insert(position + 1, SAVINGS_PCT.to_string());
    }

    ExportTable {
        file_name: schema.domain.export_file_name(),
        columns,
        rows: formatted,
    }
}

fn row_savings_pct(row: &Arc<Row>, current: Option<usize>, savings: Option<usize>) -> f64 {
    let value = |index: Option<usize>| index.and_then(|i| row.get(i).as_f64()).unwrap_or(0.0);
    percentage(value(savings), value(current))
}

fn format_cell(schema: &SchemaDescriptor, column: &str, value: &Value) -> String {
    match value {
        Value::Number(n) if schema.is_cost_column(column) => format_currency(*n),
        Value::Number(n) if schema.is_rate_column(column) => format_rate(*n),
        Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        other => other.to_string(),
    }
}

/// `$1,234.56`, negative amounts as `-$1,234.56`
pub fn format_currency(amount: f64) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if amount < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, group_thousands(whole), cents)
}

/// Hourly rate with four decimals
pub fn format_rate(rate: f64) -> String {
    format!("${:.4}", rate)
}

pub fn format_percent(pct: f64) -> String {
    format!("{:.2}%", pct)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use crate::schema::REGION;

    const DATAFLOW_CSV: &str = "\
job_name,project_id,region,current_machine_type,target_machine_type,current_machine_hourly_rate,target_machine_hourly_rate,current_cost,target_cost,savings,created_at
etl-daily,analytics,us-central1,n1-standard-8,n2-standard-4,0.38,0.19,1234.5,600,634.5,2024-03-01 10:00:00
Stream-Ingest,ingest,europe-west1,n1-standard-4,e2-standard-4,0.19,0.134,0,0,0,not a date
";

    fn records() -> RecordSet {
        loader::load(DATAFLOW_CSV.as_bytes(), Domain::Dataflow.schema()).unwrap()
    }

    #[test]
    fn test_default_columns_skip_missing() {
        let csv = "job_name,current_cost,target_cost,savings,extra\nj,1,1,0,x\n";
        let records = loader::load(csv.as_bytes(), Domain::Dataflow.schema()).unwrap();
        let table = record_table(&records, &RecordQuery::default());
        assert_eq!(table.columns, vec!["job_name", "current_cost", "target_cost", "savings"]);
    }

    #[test]
    fn test_requested_columns_keep_order_and_drop_unknown() {
        let query = RecordQuery::default().columns(["savings", "nope", "job_name"]);
        let table = record_table(&records(), &query);
        assert_eq!(table.columns, vec!["savings", "job_name"]);
        assert_eq!(table.rows[0], vec![Value::Number(634.5), Value::Text("etl-daily".into())]);
    }

    #[test]
    fn test_search_uses_domain_search_columns() {
        let query = RecordQuery::default().search("stream");
        let table = record_table(&records(), &query);
        assert_eq!(table.len(), 1);

        // Region is not a search column.
        let query = RecordQuery::default().search("europe");
        assert!(record_table(&records(), &query).is_empty());
    }

    #[test]
    fn test_export_inserts_savings_pct_after_savings() {
        let query = RecordQuery::new(FilterSpec::new().with(REGION, "us-central1"))
            .columns(["job_name", "current_cost", "savings", "current_machine_hourly_rate"]);
        let export = export_table(&records(), &query);

        assert_eq!(export.file_name, "dataflow_filtered_data.csv");
        assert_eq!(
            export.columns,
            vec!["job_name", "current_cost", "savings", "Savings %", "current_machine_hourly_rate"]
        );
        assert_eq!(
            export.rows[0],
            vec!["etl-daily", "$1,234.50", "$634.50", "51.40%", "$0.3800"]
        );
    }

    #[test]
    fn test_export_zero_cost_row_has_zero_pct() {
        let query = RecordQuery::default().search("ingest");
        let export = export_table(&records(), &query);
        let pct = export.columns.iter().position(|c| c == SAVINGS_PCT).unwrap();
        assert_eq!(export.rows[0][pct], "0.00%");
    }

    #[test]
    fn test_export_without_current_cost_has_no_pct() {
        let query = RecordQuery::default().columns(["job_name", "savings"]);
        let export = export_table(&records(), &query);
        assert_eq!(export.columns, vec!["job_name", "savings"]);
    }

    #[test]
    fn test_csv_bytes_are_quoted() {
        let query = RecordQuery::default().columns(["job_name", "current_cost", "savings", "created_at"]);
        let bytes = export_table(&records(), &query).to_csv_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("job_name,current_cost,savings,Savings %,created_at"));
        assert_eq!(
            lines.next(),
            Some("etl-daily,\"$1,234.50\",$634.50,51.40%,2024-03-01 10:00:00")
        );
        // Unparseable timestamp exported as empty.
        assert_eq!(lines.next(), Some("Stream-Ingest,$0.00,$0.00,0.00%,"));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-42.5), "-$42.50");
        assert_eq!(format_rate(0.1), "$0.1000");
        assert_eq!(format_percent(12.346), "12.35%");
    }
}
