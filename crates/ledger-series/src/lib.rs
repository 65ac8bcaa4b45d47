#![deny(warnings)]

//! Time-series rollup of mining records.
//!
//! Records are bucketed by exact timestamp and rolled up into three tiers:
//! leaf series, group totals and a grand total. Group totals backed by a
//! single leaf and a grand total over a single series are elided.

use thiserror::Error;

pub mod labels;
pub mod metric;
pub mod rollup;
pub mod view;
pub mod window;

pub use labels::SeriesLabels;
pub use metric::{MiningMetric, NumberFormat};
pub use rollup::{aggregate, CategoryName, Series, SeriesKey, SeriesRollup, TimedValue};
pub use view::{ChartView, StatusEntry};
pub use window::{DateWindow, QuickDate};

/// Errors produced when parsing user-facing names.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("unknown quick date: {0}")]
    UnknownQuickDate(String),
}
