//! Value extracted from each mining record.

use crate::rollup::TimedValue;
use crate::ParseError;
use ledger_core::MiningEvent;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a metric's numbers are shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberFormat {
    /// Currency, two decimals with an ISK suffix.
    Isk,
    /// Plain number, two decimals.
    Double,
    /// Whole units.
    Items,
}

impl NumberFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            NumberFormat::Isk => format!("{} ISK", group_thousands(&format!("{value:.2}"))),
            NumberFormat::Double => group_thousands(&format!("{value:.2}")),
            NumberFormat::Items => group_thousands(&format!("{:.0}", value.round())),
        }
    }
}

fn group_thousands(s: &str) -> String {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (int, frac) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let mut out = String::with_capacity(s.len() + int.len() / 3);
    out.push_str(sign);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Which number of a mining record feeds the series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MiningMetric {
    /// Ore sell value.
    #[default]
    Ore,
    /// Value of the materials after reprocessing with current skills.
    Reprocessed,
    /// Value of the materials at perfect reprocessing yield.
    ReprocessedMax,
    /// Volume in m³.
    Volume,
    /// Units mined.
    Count,
}

impl MiningMetric {
    pub const ALL: [MiningMetric; 5] = [
        MiningMetric::Ore,
        MiningMetric::Reprocessed,
        MiningMetric::ReprocessedMax,
        MiningMetric::Volume,
        MiningMetric::Count,
    ];

    pub fn value(self, event: &MiningEvent) -> f64 {
        match self {
            MiningMetric::Ore => to_f64(event.value()),
            MiningMetric::Reprocessed => to_f64(event.value_reprocessed()),
            MiningMetric::ReprocessedMax => to_f64(event.value_reprocessed_max()),
            MiningMetric::Volume => to_f64(event.volume_total()),
            MiningMetric::Count => event.count as f64,
        }
    }

    pub fn number_format(self) -> NumberFormat {
        match self {
            MiningMetric::Ore | MiningMetric::Reprocessed | MiningMetric::ReprocessedMax => {
                NumberFormat::Isk
            }
            MiningMetric::Volume => NumberFormat::Double,
            MiningMetric::Count => NumberFormat::Items,
        }
    }

    pub fn format(self, value: f64) -> String {
        self.number_format().format(value)
    }

    /// Stable name used in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            MiningMetric::Ore => "ore",
            MiningMetric::Reprocessed => "reprocessed",
            MiningMetric::ReprocessedMax => "reprocessed-max",
            MiningMetric::Volume => "volume",
            MiningMetric::Count => "count",
        }
    }

    /// Turn mining events into the records the rollup consumes.
    pub fn timed_values(self, events: &[MiningEvent]) -> Vec<TimedValue> {
        events
            .iter()
            .map(|e| TimedValue {
                timestamp: e.date,
                category: e.type_id,
                value: self.value(e),
            })
            .collect()
    }
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

impl fmt::Display for MiningMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MiningMetric::Ore => "Ore Value",
            MiningMetric::Reprocessed => "Reprocessed Value",
            MiningMetric::ReprocessedMax => "Reprocessed Value (Max)",
            MiningMetric::Volume => "Volume",
            MiningMetric::Count => "Count",
        };
        f.write_str(text)
    }
}

impl FromStr for MiningMetric {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or(ParseError::UnknownMetric(s))
    }
}
