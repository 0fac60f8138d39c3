//! Scalar summary metrics

use std::collections::{BTreeMap, HashSet};

use super::percentage;
use crate::models::{HourlyRates, RecordSet, SummaryMetrics, TopGroup, Value};
use crate::schema::{CURRENT_MACHINE_TYPE, REGION};

/// Compute the headline metrics of a (filtered) record set.
///
/// Never fails: an empty set produces zeros and no top groups.
pub fn summarize(records: &RecordSet) -> SummaryMetrics {
    let schema = records.schema();

    let total_current_cost = records.sum(schema.current_cost);
    let total_target_cost = records.sum(schema.target_cost);
    let total_savings = records.sum(schema.savings);

    let distinct_counts = schema
        .distinct_columns
        .iter()
        .map(|column| (column.to_string(), count_distinct(records, column)))
        .collect();

    let savings: Vec<f64> = records
        .column_values(schema.savings)
        .filter_map(Value::as_f64)
        .collect();
    let mean_savings = mean(&savings);
    let mean_current = mean(
        &records
            .column_values(schema.current_cost)
            .filter_map(Value::as_f64)
            .collect::<Vec<_>>(),
    );

    let (max_savings, max_savings_pct) = max_savings(records);

    let hourly_rates = schema.hourly_rate_columns.and_then(|(current, target)| {
        if !records.has_column(current) || !records.has_column(target) {
            return None;
        }
        let avg_current_rate = column_mean(records, current);
        let avg_target_rate = column_mean(records, target);
        Some(HourlyRates {
            avg_current_rate,
            avg_target_rate,
            rate_reduction_pct: percentage(avg_current_rate - avg_target_rate, avg_current_rate),
        })
    });

    let total_nodes = schema
        .node_count_column
        .filter(|column| records.has_column(column))
        .map(|column| records.sum(column));

    SummaryMetrics {
        total_current_cost,
        total_target_cost,
        total_savings,
        savings_pct: percentage(total_savings, total_current_cost),
        cost_reduction_pct: percentage(total_current_cost - total_target_cost, total_current_cost),
        annual_savings: total_savings * 12.0,
        row_count: records.len(),
        distinct_counts,
        mean_savings,
        mean_savings_pct: percentage(mean_savings, mean_current),
        max_savings,
        max_savings_pct,
        top_region: top_group(records, REGION, schema.savings),
        top_current_machine: top_group(records, CURRENT_MACHINE_TYPE, schema.current_cost),
        hourly_rates,
        total_nodes,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn column_mean(records: &RecordSet, column: &str) -> f64 {
    let values: Vec<f64> = records
        .column_values(column)
        .filter_map(Value::as_f64)
        .collect();
    mean(&values)
}

fn count_distinct(records: &RecordSet, column: &str) -> usize {
    records
        .column_values(column)
        .filter_map(Value::key)
        .collect::<HashSet<_>>()
        .len()
}

/// Largest per-row savings and its percentage of that row's current cost.
/// Ties resolve to the first row.
fn max_savings(records: &RecordSet) -> (f64, f64) {
    let schema = records.schema();
    let (Some(savings_idx), Some(cost_idx)) = (
        records.column_index(schema.savings),
        records.column_index(schema.current_cost),
    ) else {
        return (0.0, 0.0);
    };

    let mut best: Option<(f64, f64)> = None;
    for row in records.rows() {
        let Some(savings) = row.get(savings_idx).as_f64() else {
            continue;
        };
        if best.map(|(max, _)| savings > max).unwrap_or(true) {
            best = Some((savings, row.get(cost_idx).as_f64().unwrap_or(0.0)));
        }
    }

    best.map(|(savings, cost)| (savings, percentage(savings, cost)))
        .unwrap_or((0.0, 0.0))
}

/// Group by `key_column`, sum `measure`, return the largest group.
///
/// Groups are visited in ascending key order and the first maximum wins.
fn top_group(records: &RecordSet, key_column: &str, measure: &str) -> Option<TopGroup> {
    let schema = records.schema();
    let key_idx = records.column_index(key_column)?;
    let measure_idx = records.column_index(measure);
    let savings_idx = records.column_index(schema.savings);
    let cost_idx = records.column_index(schema.current_cost);

    // key -> (measure, savings, current cost)
    let mut groups: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
    for row in records.rows() {
        let Some(key) = row.get(key_idx).key() else {
            continue;
        };
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i).as_f64()).unwrap_or(0.0);
        let entry = groups.entry(key).or_default();
        entry.0 += cell(measure_idx);
        entry.1 += cell(savings_idx);
        entry.2 += cell(cost_idx);
    }

    let mut top: Option<(String, (f64, f64, f64))> = None;
    for (key, totals) in groups {
        if top.as_ref().map(|(_, best)| totals.0 > best.0).unwrap_or(true) {
            top = Some((key, totals));
        }
    }

    top.map(|(key, (amount, savings, cost))| TopGroup {
        key,
        amount,
        savings_pct: percentage(savings, cost),
    })
}
