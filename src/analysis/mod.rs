//! Analysis module
//!
//! Aggregations over stored frequency and census data.

pub mod frequency;
pub mod report;

pub use frequency::{per_capita, sum_frequency, FrequencyEntry, PerCapitaEntry};
