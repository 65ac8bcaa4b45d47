//! Date windows applied before aggregation.

use crate::ParseError;
use chrono::{Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Open or closed time interval with exclusive bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl DateWindow {
    /// Window that admits everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        Self { from, to }
    }

    /// Window spanning whole days: `from` at 00:00:00 and `to` at 23:59:59.
    ///
    /// A `from` day after the `to` day moves `to` onto `from`.
    pub fn from_days(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let to = match (from, to) {
            (Some(f), Some(t)) if f > t => Some(f),
            _ => to,
        };
        Self {
            from: from.map(start_of_day),
            to: to.map(end_of_day),
        }
    }

    /// Strictly after `from` and strictly before `to`; absent bounds admit all.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.from.map_or(true, |from| ts > from) && self.to.map_or(true, |to| ts < to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

fn start_of_day(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN)
}

fn end_of_day(d: NaiveDate) -> NaiveDateTime {
    d.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of_day(d))
}

/// Preset ranges ending at the selected (or current) day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickDate {
    Reset,
    Days7,
    Days14,
    Days30,
    Months3,
    Months6,
    Year1,
    Years2,
}

impl QuickDate {
    pub const ALL: [QuickDate; 8] = [
        QuickDate::Reset,
        QuickDate::Days7,
        QuickDate::Days14,
        QuickDate::Days30,
        QuickDate::Months3,
        QuickDate::Months6,
        QuickDate::Year1,
        QuickDate::Years2,
    ];

    /// The `from` day of the preset for a window ending on `to`.
    pub fn apply(self, to: NaiveDate) -> Option<NaiveDate> {
        match self {
            QuickDate::Reset => None,
            QuickDate::Days7 => to.checked_sub_days(Days::new(7)),
            QuickDate::Days14 => to.checked_sub_days(Days::new(14)),
            QuickDate::Days30 => to.checked_sub_days(Days::new(30)),
            QuickDate::Months3 => to.checked_sub_months(Months::new(3)),
            QuickDate::Months6 => to.checked_sub_months(Months::new(6)),
            QuickDate::Year1 => to.checked_sub_months(Months::new(12)),
            QuickDate::Years2 => to.checked_sub_months(Months::new(24)),
        }
    }

    /// The preset describing a window, if any. An open `to` means `today`.
    pub fn matching(from: Option<NaiveDate>, to: Option<NaiveDate>, today: NaiveDate) -> Option<Self> {
        let from = match (from, to) {
            (None, None) => return Some(QuickDate::Reset),
            (None, Some(_)) => return None,
            (Some(f), _) => f,
        };
        let to = to.unwrap_or(today);
        Self::ALL
            .into_iter()
            .find(|q| q.apply(to) == Some(from))
    }

    pub fn name(self) -> &'static str {
        match self {
            QuickDate::Reset => "reset",
            QuickDate::Days7 => "7d",
            QuickDate::Days14 => "14d",
            QuickDate::Days30 => "30d",
            QuickDate::Months3 => "3m",
            QuickDate::Months6 => "6m",
            QuickDate::Year1 => "1y",
            QuickDate::Years2 => "2y",
        }
    }
}

impl FromStr for QuickDate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|q| q.name() == s)
            .ok_or(ParseError::UnknownQuickDate(s))
    }
}
