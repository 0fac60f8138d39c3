//! Core data models for the rightsizing dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::schema::SchemaDescriptor;

/// Sentinel selection meaning "no filter on this column"
pub const ALL: &str = "All";

/// A single cell of a recommendation table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Absent,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Numeric view of the cell; text and timestamps are not numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Key used for grouping and distinct counting. Absent cells have no key.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Absent => None,
            other => Some(other.to_string()),
        }
    }

    /// Exact equality against a filter selection
    pub fn matches(&self, selected: &str) -> bool {
        match self {
            Value::Text(s) => s == selected,
            Value::Number(n) => selected.parse::<f64>().map(|v| v == *n).unwrap_or(false),
            Value::Timestamp(ts) => ts.to_rfc3339() == selected,
            Value::Absent => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            Value::Absent => Ok(()),
        }
    }
}

/// One recommendation record, positionally aligned with its RecordSet's columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Absent)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Immutable ordered set of rows sharing a header and a domain schema.
///
/// Rows are reference counted so that filters and searches build new sets
/// without copying cell data.
#[derive(Debug, Clone)]
pub struct RecordSet {
    schema: &'static SchemaDescriptor,
    columns: Arc<[String]>,
    rows: Vec<Arc<Row>>,
}

impl RecordSet {
    pub fn new(schema: &'static SchemaDescriptor, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            schema,
            columns: columns.into(),
            rows: rows.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build a new set over a subsequence of this one's rows
    pub fn derive(&self, rows: Vec<Arc<Row>>) -> Self {
        Self {
            schema: self.schema,
            columns: Arc::clone(&self.columns),
            rows,
        }
    }

    pub fn schema(&self) -> &'static SchemaDescriptor {
        self.schema
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn rows(&self) -> &[Arc<Row>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate a column's cells; yields nothing when the column is missing
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let index = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |row| index.map(|i| row.get(i)))
    }

    /// Sum of the numeric cells of a column, skipping absent cells
    pub fn sum(&self, column: &str) -> f64 {
        self.column_values(column).filter_map(Value::as_f64).sum()
    }
}

impl PartialEq for RecordSet {
    fn eq(&self, other: &Self) -> bool {
        self.schema.domain == other.schema.domain
            && self.columns == other.columns
            && self.rows.len() == other.rows.len()
            && self
                .rows
                .iter()
                .zip(other.rows.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b) || a == b)
    }
}

/// Selection for one filter column, serialized as the selected text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    All,
    Value(String),
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Value(value.to_string())
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Selection::from(value.as_str())
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => ALL.to_string(),
            Selection::Value(v) => v,
        }
    }
}

/// Column -> selected value. Selections combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    selections: BTreeMap<String, Selection>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, selection: impl Into<Selection>) -> Self {
        self.set(column, selection);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, selection: impl Into<Selection>) {
        self.selections.insert(column.into(), selection.into());
    }

    /// Selections that actually constrain rows
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.selections.iter().filter_map(|(column, selection)| match selection {
            Selection::All => None,
            Selection::Value(v) => Some((column.as_str(), v.as_str())),
        })
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }
}

/// Group with the largest aggregate for some measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopGroup {
    pub key: String,
    pub amount: f64,
    pub savings_pct: f64,
}

/// Scalar aggregates over a RecordSet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_current_cost: f64,
    pub total_target_cost: f64,
    pub total_savings: f64,
    pub savings_pct: f64,
    pub cost_reduction_pct: f64,
    pub annual_savings: f64,
    pub row_count: usize,
    pub distinct_counts: BTreeMap<String, usize>,
    pub mean_savings: f64,
    pub mean_savings_pct: f64,
    pub max_savings: f64,
    pub max_savings_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_region: Option<TopGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_current_machine: Option<TopGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rates: Option<HourlyRates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_nodes: Option<f64>,
}

/// Mean machine hourly rates before and after rightsizing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyRates {
    pub avg_current_rate: f64,
    pub avg_target_rate: f64,
    pub rate_reduction_pct: f64,
}

/// One group of a breakdown table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub keys: Vec<String>,
    pub values: Vec<Value>,
    pub savings_pct: f64,
}

/// Grouped aggregation result with a derived savings percentage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownTable {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<BreakdownRow>,
}

impl BreakdownTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Numeric value of a named output column for one row
    pub fn value(&self, row: &BreakdownRow, column: &str) -> Option<f64> {
        let index = self.value_columns.iter().position(|c| c == column)?;
        row.values.get(index).and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_all_sentinel() {
        assert_eq!(Selection::from("All"), Selection::All);
        assert_eq!(Selection::from("all"), Selection::Value("all".to_string()));
    }

    #[test]
    fn test_filter_spec_active_skips_all() {
        let spec = FilterSpec::new()
            .with("region", "All")
            .with("project_id", "p1");
        let active: Vec<_> = spec.active().collect();
        assert_eq!(active, vec![("project_id", "p1")]);
        assert!(!spec.is_unconstrained());
        assert!(FilterSpec::new().with("region", ALL).is_unconstrained());
    }

    #[test]
    fn test_filter_spec_serializes_as_plain_map() {
        let spec = FilterSpec::new().with("region", "us-east1").with("service", "All");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"selections": {"region": "us-east1", "service": "All"}})
        );
        let back: FilterSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_value_matches_is_exact() {
        let v = Value::Text("us-east1".to_string());
        assert!(v.matches("us-east1"));
        assert!(!v.matches("US-EAST1"));
        assert!(!v.matches("us-east"));
        assert!(!Value::Absent.matches(""));
        assert!(Value::Number(3.0).matches("3"));
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Text("a".to_string()),
            Value::Number(1.5),
            Value::Absent,
        ])
        .unwrap();
        assert_eq!(json, r#"["a",1.5,null]"#);
    }
}
