//! Statistics calculation engine.
//!
//! Pure functions over [`RecordView`](crate::models::RecordView) slices:
//! - Overall totals, streaks and grouped breakdowns
//! - Per-opponent summaries
//! - Head-to-head detail against one opponent
//!
//! Inputs are expected newest first, the order the record store returns.

mod opponents;
mod overview;
mod streak;

#[cfg(test)]
pub(crate) mod testing;

pub use opponents::*;
pub use overview::*;
pub use streak::*;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Win percentage rounded to one decimal. 0 when there are no matches.
pub fn win_rate_percent(wins: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(wins as f64 / total as f64 * 100.0)
    }
}

/// Mean of the values, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
