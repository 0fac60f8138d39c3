//! Grouped breakdown tables

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::percentage;
use crate::models::{BreakdownRow, BreakdownTable, RecordSet, Row, Value};

/// Name under which the derived percentage can be used as a sort key
pub const SAVINGS_PCT: &str = "Savings %";

/// Per-group reduction of a source column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "column", rename_all = "snake_case")]
pub enum Reducer {
    Sum(String),
    Mean(String),
    /// Number of rows in the group
    Count,
    CountDistinct(String),
    /// First non-absent value in row order
    First(String),
    /// Sorted distinct values joined with ", "
    JoinDistinct(String),
}

/// Output column produced by a reducer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub output: String,
    pub reducer: Reducer,
}

/// Denominator of the derived savings percentage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentBasis {
    /// savings / current cost
    #[default]
    CurrentCost,
    /// savings / (target cost + savings), used for target-machine views
    TargetPlusSavings,
}

/// Grouping, reducers, ordering and truncation of one breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownSpec {
    pub group_keys: Vec<String>,
    pub aggregations: Vec<Aggregation>,
    /// Output column (or `Savings %`) to sort descending by
    pub sort_key: Option<String>,
    pub top_n: Option<usize>,
    #[serde(default)]
    pub percent_basis: PercentBasis,
    /// Every row is its own group, in row order, and absent keys show as ""
    #[serde(default)]
    pub per_row: bool,
}

impl BreakdownSpec {
    pub fn new(group_keys: &[&str]) -> Self {
        Self {
            group_keys: group_keys.iter().map(|k| k.to_string()).collect(),
            aggregations: Vec::new(),
            sort_key: None,
            top_n: None,
            percent_basis: PercentBasis::CurrentCost,
            per_row: false,
        }
    }

    pub fn aggregate(mut self, output: &str, reducer: Reducer) -> Self {
        self.aggregations.push(Aggregation {
            output: output.to_string(),
            reducer,
        });
        self
    }

    pub fn sum(self, output: &str, column: &str) -> Self {
        self.aggregate(output, Reducer::Sum(column.to_string()))
    }

    pub fn mean(self, output: &str, column: &str) -> Self {
        self.aggregate(output, Reducer::Mean(column.to_string()))
    }

    pub fn count(self, output: &str) -> Self {
        self.aggregate(output, Reducer::Count)
    }

    pub fn count_distinct(self, output: &str, column: &str) -> Self {
        self.aggregate(output, Reducer::CountDistinct(column.to_string()))
    }

    pub fn first(self, output: &str, column: &str) -> Self {
        self.aggregate(output, Reducer::First(column.to_string()))
    }

    pub fn join_distinct(self, output: &str, column: &str) -> Self {
        self.aggregate(output, Reducer::JoinDistinct(column.to_string()))
    }

    pub fn sort_by(mut self, key: &str) -> Self {
        self.sort_key = Some(key.to_string());
        self
    }

    pub fn top(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn percent_basis(mut self, basis: PercentBasis) -> Self {
        self.percent_basis = basis;
        self
    }

    /// List individual rows instead of merging equal keys
    pub fn per_row(mut self) -> Self {
        self.per_row = true;
        self
    }
}

/// Group `records` by the breakdown's keys and reduce each group.
///
/// Rows with an absent key cell are left out unless `per_row` is set. Groups are formed in ascending
/// key order; the descending sort is stable so equal groups keep that order.
pub fn breakdown(records: &RecordSet, spec: &BreakdownSpec) -> BreakdownTable {
    let schema = records.schema();
    let key_indices: Vec<Option<usize>> = spec
        .group_keys
        .iter()
        .map(|k| records.column_index(k))
        .collect();

    let groups: Vec<(Vec<String>, Vec<&Row>)> = if spec.per_row {
        records
            .rows()
            .iter()
            .map(|row| {
                let key = key_indices
                    .iter()
                    .map(|index| index.and_then(|i| row.get(i).key()).unwrap_or_default())
                    .collect();
                (key, vec![row.as_ref()])
            })
            .collect()
    } else {
        let mut grouped: BTreeMap<Vec<String>, Vec<&Row>> = BTreeMap::new();
        'rows: for row in records.rows() {
            let mut key = Vec::with_capacity(key_indices.len());
            for index in &key_indices {
                match index.and_then(|i| row.get(i).key()) {
                    Some(part) => key.push(part),
                    None => continue 'rows,
                }
            }
            grouped.entry(key).or_default().push(row.as_ref());
        }
        grouped.into_iter().collect()
    };

    let column = |name: &str| records.column_index(name);
    let savings_idx = column(schema.savings);
    let current_idx = column(schema.current_cost);
    let target_idx = column(schema.target_cost);

    let mut rows: Vec<BreakdownRow> = groups
        .into_iter()
        .map(|(keys, members)| {
            let values = spec
                .aggregations
                .iter()
                .map(|agg| reduce(&agg.reducer, &members, records))
                .collect();

            let savings = sum_at(&members, savings_idx);
            let denominator = match spec.percent_basis {
                PercentBasis::CurrentCost => sum_at(&members, current_idx),
                PercentBasis::TargetPlusSavings => sum_at(&members, target_idx) + savings,
            };

            BreakdownRow {
                keys,
                values,
                savings_pct: percentage(savings, denominator),
            }
        })
        .collect();

    if let Some(sort_key) = &spec.sort_key {
        let position = spec.aggregations.iter().position(|a| &a.output == sort_key);
        let sort_value = |row: &BreakdownRow| -> f64 {
            if sort_key == SAVINGS_PCT {
                return row.savings_pct;
            }
            position
                .and_then(|p| row.values.get(p))
                .and_then(Value::as_f64)
                .unwrap_or(f64::NEG_INFINITY)
        };
        rows.sort_by(|a, b| sort_value(b).total_cmp(&sort_value(a)));
    }

    if let Some(n) = spec.top_n {
        rows.truncate(n);
    }

    BreakdownTable {
        key_columns: spec.group_keys.clone(),
        value_columns: spec.aggregations.iter().map(|a| a.output.clone()).collect(),
        rows,
    }
}

fn sum_at(members: &[&Row], index: Option<usize>) -> f64 {
    match index {
        Some(i) => members.iter().filter_map(|r| r.get(i).as_f64()).sum(),
        None => 0.0,
    }
}

fn reduce(reducer: &Reducer, members: &[&Row], records: &RecordSet) -> Value {
    let cells = |column: &str| -> Vec<&Value> {
        match records.column_index(column) {
            Some(i) => members
                .iter()
                .map(|r| r.get(i))
                .filter(|v| !v.is_absent())
                .collect(),
            None => Vec::new(),
        }
    };

    match reducer {
        Reducer::Sum(column) => Value::Number(cells(column).iter().filter_map(|v| v.as_f64()).sum()),
        Reducer::Mean(column) => {
            let numbers: Vec<f64> = cells(column).iter().filter_map(|v| v.as_f64()).collect();
            if numbers.is_empty() {
                Value::Number(0.0)
            } else {
                Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        Reducer::Count => Value::Number(members.len() as f64),
        Reducer::CountDistinct(column) => {
            let distinct: BTreeSet<String> = cells(column).iter().filter_map(|v| v.key()).collect();
            Value::Number(distinct.len() as f64)
        }
        Reducer::First(column) => cells(column)
            .first()
            .map(|v| (*v).clone())
            .unwrap_or(Value::Absent),
        Reducer::JoinDistinct(column) => {
            let distinct: BTreeSet<String> = cells(column).iter().filter_map(|v| v.key()).collect();
            Value::Text(distinct.into_iter().collect::<Vec<_>>().join(", "))
        }
    }
}
