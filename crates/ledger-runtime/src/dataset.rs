//! Input data: the item catalog, prices and the mining ledger.

use crate::config::ConfigError;
use chrono::{Days, NaiveDate};
use ledger_core::{
    validate_catalog, validate_event, validate_prices, Item, ItemCatalog, ItemId, MiningEvent,
    PriceLookup, PriceTable, ReprocessedMaterial,
};
use ledger_econ::ReprocessSettings;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub items: ItemCatalog,
    pub prices: PriceTable,
    pub mining: Vec<MiningEvent>,
}

impl Dataset {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let data: Dataset = serde_json::from_str(text)?;
        data.validate()?;
        Ok(data)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check invariants; dangling material references are only warned about.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dangling = validate_catalog(&self.items)?;
        if dangling > 0 {
            warn!(dangling, "catalog references unknown materials");
        }
        validate_prices(&self.prices)?;
        for event in &self.mining {
            validate_event(event)?;
        }
        info!(
            items = self.items.len(),
            prices = self.prices.len(),
            mining = self.mining.len(),
            "dataset loaded"
        );
        Ok(())
    }

    /// Seeded synthetic dataset: three ore groups and a few months of mining.
    pub fn demo(seed: u64, start: NaiveDate, days: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut items: Vec<Item> = Vec::new();
        let mut prices = PriceTable::new();

        let minerals = [(34, "Tritanium", 5.0), (35, "Pyerite", 9.0), (36, "Mexallon", 60.0)];
        for (id, name, base) in minerals {
            items.push(item(id, name, "Mineral", Vec::new()));
            prices.set(ItemId(id), noisy(&mut rng, base));
        }
        let ores: [(u32, &str, &str, &[(u32, u64)]); 6] = [
            (1230, "Veldspar", "Veldspar", &[(34, 400)]),
            (17470, "Concentrated Veldspar", "Veldspar", &[(34, 420)]),
            (17471, "Dense Veldspar", "Veldspar", &[(34, 440)]),
            (1228, "Scordite", "Scordite", &[(34, 150), (35, 90)]),
            (17463, "Condensed Scordite", "Scordite", &[(34, 158), (35, 95)]),
            (1224, "Pyroxeres", "Pyroxeres", &[(35, 90), (36, 30)]),
        ];
        for (id, name, group, materials) in ores {
            let materials = materials
                .iter()
                .map(|&(m, quantity)| ReprocessedMaterial {
                    type_id: ItemId(m),
                    quantity,
                })
                .collect();
            items.push(item(id, name, group, materials));
        }
        let catalog: ItemCatalog = items.into();

        // Ore sells slightly below what its minerals fetch.
        let reprocess = ReprocessSettings::default();
        let perfect = ReprocessSettings::perfect();
        let mut unit_values = Vec::new();
        for (id, ..) in ores {
            let Some(ore) = catalog.get(ItemId(id)) else {
                continue;
            };
            let value_at = |settings: &ReprocessSettings| {
                let batch: Decimal = ore
                    .materials
                    .iter()
                    .map(|m| prices.price_or_zero(m.type_id) * Decimal::from(settings.left(m.quantity, false)))
                    .sum();
                batch / Decimal::from(ore.portion)
            };
            let reprocessed = value_at(&reprocess);
            let max = value_at(&perfect);
            let price = (max * Decimal::new(85, 2)).round_dp(2);
            unit_values.push((ore.type_id, ore.volume, price, reprocessed.round_dp(2), max.round_dp(2)));
        }
        for &(id, _, price, ..) in &unit_values {
            prices.set(id, price);
        }

        let characters = ["Ore Hauler", "Rock Biter"];
        let mut mining = Vec::new();
        for day in 0..days {
            let Some(date) = start.checked_add_days(Days::new(day)) else {
                break;
            };
            let Some(date) = date.and_hms_opt(0, 0, 0) else {
                continue;
            };
            for character in characters {
                for &(type_id, volume, price, reprocessed, max) in &unit_values {
                    if rng.gen_bool(0.6) {
                        continue;
                    }
                    mining.push(MiningEvent {
                        date,
                        type_id,
                        character: character.to_string(),
                        count: rng.gen_range(1_000..40_000),
                        price,
                        price_reprocessed: reprocessed,
                        price_reprocessed_max: max,
                        volume,
                    });
                }
            }
        }

        Dataset {
            items: catalog,
            prices,
            mining,
        }
    }
}

fn item(id: u32, name: &str, group: &str, materials: Vec<ReprocessedMaterial>) -> Item {
    let ore = !materials.is_empty();
    Item {
        type_id: ItemId(id),
        name: name.to_string(),
        group: group.to_string(),
        volume: if ore { Decimal::new(1, 1) } else { Decimal::new(1, 2) },
        portion: if ore { 100 } else { 1 },
        materials,
    }
}

fn noisy(rng: &mut ChaCha8Rng, base: f64) -> Decimal {
    let factor: f64 = rng.gen_range(0.9..1.1);
    Decimal::from_f64(base * factor)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    #[test]
    fn demo_is_seeded_and_valid() {
        let a = Dataset::demo(7, start(), 30);
        let b = Dataset::demo(7, start(), 30);
        assert_eq!(a, b);
        a.validate().unwrap();
        assert_eq!(a.items.len(), 9);
        assert!(!a.mining.is_empty());
        assert!(a.mining.iter().all(|e| e.price_reprocessed <= e.price_reprocessed_max));
        assert_ne!(a, Dataset::demo(8, start(), 30));
    }

    #[test]
    fn json_roundtrip() {
        let data = Dataset::demo(1, start(), 3);
        let text = serde_json::to_string(&data).unwrap();
        let back = Dataset::from_json(&text).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn invalid_dataset_rejected() {
        let text = r#"{"prices": {"34": -1}}"#;
        assert!(matches!(
            Dataset::from_json(text),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(Dataset::from_json("{"), Err(ConfigError::Json(_))));
    }
}
