//! Grouped time-series aggregation: leaf → group total → grand total.

use crate::window::DateWindow;
use chrono::NaiveDateTime;
use ledger_core::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// One observation handed over by the data layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub timestamp: NaiveDateTime,
    pub category: ItemId,
    pub value: f64,
}

/// Resolved names of a category.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryName {
    /// Group the leaf rolls into; `None` for ungrouped categories.
    pub group: Option<String>,
    pub leaf: String,
}

/// Identity of an output series.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeriesKey {
    GrandTotal,
    GroupTotal(String),
    Leaf { group: Option<String>, name: String },
}

impl SeriesKey {
    pub fn is_total(&self) -> bool {
        !matches!(self, SeriesKey::Leaf { .. })
    }
}

/// One named series with its points sorted by timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub key: SeriesKey,
    /// Group total this leaf is listed under; `None` for totals and for
    /// leaves whose group total was elided.
    pub group: Option<String>,
    pub points: Vec<(NaiveDateTime, f64)>,
    /// Largest point value, never below 0.0.
    pub max: f64,
    /// Sum of every contributing record.
    pub total: f64,
}

impl Series {
    pub fn value_at(&self, ts: NaiveDateTime) -> Option<f64> {
        self.points
            .binary_search_by(|(t, _)| t.cmp(&ts))
            .ok()
            .map(|i| self.points[i].1)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Ordered output of one aggregation pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesRollup {
    series: Vec<Series>,
}

impl SeriesRollup {
    /// Series in display order.
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&Series> {
        self.series.iter().find(|s| &s.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.series.iter().map(|s| &s.key)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn into_series(self) -> Vec<Series> {
        self.series
    }
}

/// Aggregate records into ordered leaf, group total and grand total series.
///
/// Records outside `window` or whose category does not resolve are skipped.
/// A group total is kept only when two or more distinct leaves contribute;
/// the grand total only when two or more other series survive. Every
/// surviving series has a point at every timestamp seen (0.0 when absent).
pub fn aggregate<F>(records: &[TimedValue], type_name_of: F, window: &DateWindow) -> SeriesRollup
where
    F: Fn(ItemId) -> Option<CategoryName>,
{
    let mut values: BTreeMap<NaiveDateTime, HashMap<SeriesKey, f64>> = BTreeMap::new();
    let mut totals: HashMap<SeriesKey, f64> = HashMap::new();
    let mut members: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut keys: BTreeSet<SeriesKey> = BTreeSet::new();
    let mut unresolved = 0usize;

    for record in records.iter().filter(|r| window.contains(r.timestamp)) {
        let Some(name) = type_name_of(record.category) else {
            unresolved += 1;
            continue;
        };
        let mut targets = Vec::with_capacity(3);
        if let Some(group) = &name.group {
            members
                .entry(group.clone())
                .or_default()
                .insert(name.leaf.clone());
            targets.push(SeriesKey::GroupTotal(group.clone()));
        }
        targets.push(SeriesKey::Leaf {
            group: name.group,
            name: name.leaf,
        });
        targets.push(SeriesKey::GrandTotal);

        let bucket = values.entry(record.timestamp).or_default();
        for key in targets {
            *bucket.entry(key.clone()).or_insert(0.0) += record.value;
            *totals.entry(key.clone()).or_insert(0.0) += record.value;
            keys.insert(key);
        }
    }

    let group_survives = |group: &str| members.get(group).map_or(false, |m| m.len() >= 2);
    keys.retain(|k| match k {
        SeriesKey::GroupTotal(group) => group_survives(group),
        _ => true,
    });
    if keys.len() < 3 {
        // Grand total plus at most one other series.
        keys.remove(&SeriesKey::GrandTotal);
    }

    let mut series: Vec<Series> = keys
        .into_iter()
        .map(|key| {
            let group = match &key {
                SeriesKey::Leaf {
                    group: Some(group), ..
                } if group_survives(group) => Some(group.clone()),
                _ => None,
            };
            let mut max = 0.0f64;
            let points = values
                .iter()
                .map(|(ts, bucket)| {
                    let v = bucket.get(&key).copied().unwrap_or(0.0);
                    max = max.max(v);
                    (*ts, v)
                })
                .collect();
            let total = totals.get(&key).copied().unwrap_or(0.0);
            Series {
                key,
                group,
                points,
                max,
                total,
            }
        })
        .collect();
    series.sort_by_cached_key(|s| (rank(s), s.key.clone()));

    debug!(
        records = records.len(),
        unresolved,
        timestamps = values.len(),
        series = series.len(),
        "series rollup built"
    );
    SeriesRollup { series }
}

/// Sort rank: grand total, then grouped blocks, then ungrouped leaves.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    tier: u8,
    block: String,
    block_exact: String,
    within: u8,
    leaf: String,
    leaf_exact: String,
}

fn rank(s: &Series) -> Rank {
    let (tier, block, within, leaf) = match (&s.key, &s.group) {
        (SeriesKey::GrandTotal, _) => (0, "", 0, ""),
        (SeriesKey::GroupTotal(group), _) => (1, group.as_str(), 0, ""),
        (SeriesKey::Leaf { name, .. }, Some(group)) => (1, group.as_str(), 1, name.as_str()),
        (SeriesKey::Leaf { name, .. }, None) => (2, name.as_str(), 0, ""),
    };
    Rank {
        tier,
        block: block.to_lowercase(),
        block_exact: block.to_string(),
        within,
        leaf: leaf.to_lowercase(),
        leaf_exact: leaf.to_string(),
    }
}
