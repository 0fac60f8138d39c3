//! CSV loading for recommendation tables
//!
//! Cells are typed by their column role: cost, rate and scale columns are
//! numeric, the timestamp column is coerced best-effort, everything else is
//! text. Empty cells, the usual missing-value markers (`NA`, `N/A`, `null`,
//! `NaN` and friends) and non-finite numbers become `Value::Absent`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::DataLoadError;
use crate::models::{RecordSet, Row, Value};
use crate::schema::SchemaDescriptor;

/// Formats tried, in order, for timestamp columns without an offset
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S UTC",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Cell contents read as missing in any column
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Clone, Copy)]
enum ColumnKind {
    Text,
    Numeric,
    Timestamp,
}

/// Parse a delimited table from any byte source
pub fn load<R: Read>(source: R, schema: &'static SchemaDescriptor) -> Result<RecordSet, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DataLoadError::MissingHeader);
    }
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    for required in schema.required_columns() {
        if !columns.iter().any(|c| c == required) {
            return Err(DataLoadError::MissingColumn {
                column: required.to_string(),
            });
        }
    }

    let kinds: Vec<ColumnKind> = columns
        .iter()
        .map(|c| {
            if schema.timestamp_column == Some(c.as_str()) {
                ColumnKind::Timestamp
            } else if schema.is_numeric(c) {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            }
        })
        .collect();

    let mut rows = Vec::new();
    let mut coerced_timestamps = 0usize;

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let mut values = Vec::with_capacity(columns.len());

        for (index, field) in record.iter().enumerate() {
            let field = field.trim();
            if field.is_empty() || MISSING_MARKERS.contains(&field) {
                values.push(Value::Absent);
                continue;
            }
            let value = match kinds[index] {
                ColumnKind::Text => Value::Text(field.to_string()),
                ColumnKind::Numeric => match parse_number(field) {
                    Some(n) if n.is_finite() => Value::Number(n),
                    Some(_) => Value::Absent,
                    None => {
                        return Err(DataLoadError::InvalidNumber {
                            line,
                            column: columns[index].clone(),
                            value: field.to_string(),
                        })
                    }
                },
                ColumnKind::Timestamp => match parse_timestamp(field) {
                    Some(ts) => Value::Timestamp(ts),
                    None => {
                        coerced_timestamps += 1;
                        Value::Absent
                    }
                },
            };
            values.push(value);
        }
        rows.push(Row::new(values));
    }

    debug!(
        domain = %schema.domain,
        rows = rows.len(),
        columns = columns.len(),
        coerced_timestamps = coerced_timestamps,
        "Parsed recommendation table"
    );

    Ok(RecordSet::new(schema, columns, rows))
}

/// Read and parse a dataset file
pub fn load_path(path: &Path, schema: &'static SchemaDescriptor) -> Result<RecordSet, DataLoadError> {
    let bytes = std::fs::read(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load(bytes.as_slice(), schema)
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok()
}

/// Best-effort timestamp coercion; `None` marks the cell absent
pub fn parse_timestamp(field: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(field) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(field, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(field, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
