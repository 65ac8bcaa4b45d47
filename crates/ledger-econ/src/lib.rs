#![deny(warnings)]

//! Reprocessing economics for the mining ledger.
//!
//! This crate provides validated utilities for:
//! - The skill/efficiency modifier applied to reprocessed quantities
//! - The reprocessing rollup: material lines, per-source totals, a grand
//!   total and deduplicated grand material lines

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod reprocessed;

pub use reprocessed::{
    aggregate, GrandMaterial, GrandTotal, MaterialRow, RollupRow, SourceTotal,
};

/// Highest trainable skill level.
pub const MAX_SKILL_LEVEL: u8 = 5;

/// Errors produced when validating reprocess settings.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    /// Station yield is a percentage in [0, 100].
    #[error("station yield {0}% is outside [0, 100]")]
    StationYield(Decimal),
    /// Skill levels are in [0, 5].
    #[error("skill {skill} level {level} is above 5")]
    SkillLevel { skill: &'static str, level: u8 },
}

/// Reprocessing yield inputs of the character doing the reprocessing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReprocessSettings {
    /// Base station yield in percent (e.g. 50).
    pub station_yield: Decimal,
    /// Reprocessing skill level, +3% per level.
    pub reprocessing_level: u8,
    /// Reprocessing Efficiency skill level, +2% per level.
    pub reprocessing_efficiency_level: u8,
    /// Ore/scrap processing skill level, +2% per level.
    pub processing_level: u8,
}

impl Default for ReprocessSettings {
    fn default() -> Self {
        Self {
            station_yield: Decimal::new(50, 0),
            reprocessing_level: 0,
            reprocessing_efficiency_level: 0,
            processing_level: 0,
        }
    }
}

impl ReprocessSettings {
    /// Settings that keep every unit (100% yield).
    pub fn perfect() -> Self {
        Self {
            station_yield: Decimal::ONE_HUNDRED,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.station_yield < Decimal::ZERO || self.station_yield > Decimal::ONE_HUNDRED {
            return Err(SettingsError::StationYield(self.station_yield));
        }
        for (skill, level) in [
            ("reprocessing", self.reprocessing_level),
            ("reprocessing_efficiency", self.reprocessing_efficiency_level),
            ("processing", self.processing_level),
        ] {
            if level > MAX_SKILL_LEVEL {
                return Err(SettingsError::SkillLevel { skill, level });
            }
        }
        Ok(())
    }

    /// Effective yield in percent, capped at 100.
    ///
    /// `station × (1 + 0.03·R) × (1 + 0.02·E) × (1 + 0.02·P)`; `max` ignores
    /// skills and station and always returns 100.
    ///
    /// Example:
    /// let s = ReprocessSettings::default(); // 50%, no skills
    /// assert_eq!(s.percent(false), Decimal::new(50, 0));
    pub fn percent(&self, max: bool) -> Decimal {
        if max {
            return Decimal::ONE_HUNDRED;
        }
        let bonus = |level: u8, step: i64| Decimal::ONE + Decimal::new(step, 2) * Decimal::from(level);
        let pct = self
            .station_yield
            .saturating_mul(bonus(self.reprocessing_level, 3))
            .saturating_mul(bonus(self.reprocessing_efficiency_level, 2))
            .saturating_mul(bonus(self.processing_level, 2));
        pct.min(Decimal::ONE_HUNDRED).max(Decimal::ZERO)
    }

    /// Units left after reprocessing `quantity` units of a material line.
    ///
    /// Floors to whole units; saturates at `u64::MAX`.
    pub fn left(&self, quantity: u64, max: bool) -> u64 {
        let left = (Decimal::from(quantity) * self.percent(max) / Decimal::ONE_HUNDRED).floor();
        left.to_u64().unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_is_half_yield() {
        let s = ReprocessSettings::default();
        assert_eq!(s.percent(false), Decimal::new(50, 0));
        assert_eq!(s.left(400, false), 200);
        assert_eq!(s.left(401, false), 200);
        assert_eq!(s.left(401, true), 401);
    }

    #[test]
    fn skills_compound() {
        let s = ReprocessSettings {
            station_yield: Decimal::new(50, 0),
            reprocessing_level: 5,
            reprocessing_efficiency_level: 5,
            processing_level: 5,
        };
        s.validate().unwrap();
        // 50 * 1.15 * 1.10 * 1.10
        assert_eq!(s.percent(false), Decimal::new(69575, 3));
        assert_eq!(s.left(400, false), 278);
    }

    #[test]
    fn percent_is_capped() {
        let s = ReprocessSettings {
            station_yield: Decimal::ONE_HUNDRED,
            reprocessing_level: 5,
            ..ReprocessSettings::default()
        };
        assert_eq!(s.percent(false), Decimal::ONE_HUNDRED);
        assert_eq!(ReprocessSettings::perfect().left(123, false), 123);
    }

    #[test]
    fn invalid_settings_rejected() {
        let s = ReprocessSettings {
            reprocessing_efficiency_level: 6,
            ..ReprocessSettings::default()
        };
        assert_eq!(
            s.validate(),
            Err(SettingsError::SkillLevel {
                skill: "reprocessing_efficiency",
                level: 6
            })
        );
        let s = ReprocessSettings {
            station_yield: Decimal::new(101, 0),
            ..ReprocessSettings::default()
        };
        assert!(s.validate().is_err());
    }

    proptest! {
        #[test]
        fn left_never_exceeds_quantity(q in 0u64..10_000_000,
                                      r in 0u8..=5, e in 0u8..=5, p in 0u8..=5,
                                      station in 0i64..=100) {
            let s = ReprocessSettings {
                station_yield: Decimal::new(station, 0),
                reprocessing_level: r,
                reprocessing_efficiency_level: e,
                processing_level: p,
            };
            prop_assert!(s.left(q, false) <= q);
            prop_assert_eq!(s.left(q, true), q);
        }

        #[test]
        fn left_monotonic_in_skill(q in 1u64..1_000_000, r in 0u8..5) {
            let lo = ReprocessSettings { reprocessing_level: r, ..ReprocessSettings::default() };
            let hi = ReprocessSettings { reprocessing_level: r + 1, ..ReprocessSettings::default() };
            prop_assert!(hi.left(q, false) >= lo.left(q, false));
        }
    }
}
