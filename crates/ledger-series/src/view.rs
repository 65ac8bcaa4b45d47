//! What the presentation layer needs to draw a rollup for a selection.

use crate::labels::SeriesLabels;
use crate::metric::NumberFormat;
use crate::rollup::{Series, SeriesKey};
use serde::Serialize;
use std::collections::BTreeSet;

/// One summary shown next to the chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusEntry {
    pub key: SeriesKey,
    pub label: String,
    pub total: f64,
    pub formatted: String,
}

/// Visibility, axis scale and summaries derived from a rollup.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartView {
    /// Per series, in rollup order.
    pub visible: Vec<bool>,
    /// Largest value over every series, selected or not.
    pub axis_max: f64,
    /// Draw point markers when no series has two points to join.
    pub show_shapes: bool,
    pub status: Vec<StatusEntry>,
}

impl ChartView {
    /// Build the view for the selected keys.
    ///
    /// Selected totals are always summarized. A selected leaf is summarized
    /// only when its group total is not selected as well.
    pub fn build(
        series: &[Series],
        selected: &BTreeSet<SeriesKey>,
        labels: &SeriesLabels,
        format: NumberFormat,
    ) -> Self {
        let visible = series.iter().map(|s| selected.contains(&s.key)).collect();
        let axis_max = series.iter().fold(0.0f64, |m, s| m.max(s.max));
        let longest = series.iter().map(|s| s.len()).max().unwrap_or(0);
        let status = series
            .iter()
            .filter(|s| selected.contains(&s.key))
            .filter(|s| match &s.group {
                Some(group) => !selected.contains(&SeriesKey::GroupTotal(group.clone())),
                None => true,
            })
            .map(|s| StatusEntry {
                key: s.key.clone(),
                label: labels.label(&s.key),
                total: s.total,
                formatted: format.format(s.total),
            })
            .collect();
        Self {
            visible,
            axis_max,
            show_shapes: longest < 2,
            status,
        }
    }
}
