//! Row selection: equality filters, filter options and text search

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{FilterSpec, RecordSet, ALL};

/// Filter options for a column: `All` followed by its sorted distinct values.
///
/// A column missing from the schema yields just `All`.
pub fn distinct_values(records: &RecordSet, column: &str) -> Vec<String> {
    let distinct: BTreeSet<String> = records
        .column_values(column)
        .filter_map(|v| v.key())
        .collect();

    std::iter::once(ALL.to_string()).chain(distinct).collect()
}

/// Keep rows matching every active selection exactly. Order is preserved.
pub fn apply_filter(records: &RecordSet, spec: &FilterSpec) -> RecordSet {
    if spec.is_unconstrained() {
        return records.clone();
    }

    // A selection on a column the schema lacks matches no row.
    let constraints: Vec<(Option<usize>, &str)> = spec
        .active()
        .map(|(column, value)| (records.column_index(column), value))
        .collect();

    let rows = records
        .rows()
        .iter()
        .filter(|row| {
            constraints.iter().all(|(index, value)| match index {
                Some(i) => row.get(*i).matches(value),
                None => false,
            })
        })
        .map(Arc::clone)
        .collect();

    records.derive(rows)
}

/// Keep rows whose text in any of `columns` contains `term`, ignoring case.
///
/// An empty term returns the input unchanged.
pub fn full_text_search(records: &RecordSet, term: &str, columns: &[&str]) -> RecordSet {
    if term.is_empty() {
        return records.clone();
    }
    let needle = term.to_lowercase();
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|c| records.column_index(c))
        .collect();

    let rows = records
        .rows()
        .iter()
        .filter(|row| {
            indices.iter().any(|&i| {
                row.get(i)
                    .as_text()
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .map(Arc::clone)
        .collect();

    records.derive(rows)
}
