//! Filter / aggregate / derive pipeline
//!
//! This module provides:
//! - Equality filtering and filter option listing
//! - Case-insensitive full-text search
//! - Scalar summary metrics
//! - Grouped breakdown tables with a derived savings percentage
//!
//! Every operation is a pure function of its inputs and never fails; empty
//! inputs and zero denominators resolve to zero or `None`.

mod breakdown;
mod filter;
mod summary;


pub use breakdown::{
    breakdown, Aggregation, BreakdownSpec, PercentBasis, Reducer, SAVINGS_PCT,
};
pub use filter::{apply_filter, distinct_values, full_text_search};
pub use summary::summarize;

/// `100 * numerator / denominator`, or 0 when the denominator is not positive
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}
