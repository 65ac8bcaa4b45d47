#![deny(warnings)]

//! Core domain models and invariants for the mining ledger.
//!
//! This crate defines the serializable records shared by the rollup crates:
//! item definitions with their reprocessing breakdown, sell prices and
//! mining events, plus validation helpers for basic invariants.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Game type identifier of an item, e.g. 1230 for Veldspar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of an item's reprocessing breakdown, per portion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReprocessedMaterial {
    /// Material produced.
    pub type_id: ItemId,
    /// Units produced from one portion at perfect yield.
    pub quantity: u64,
}

fn default_portion() -> u32 {
    1
}

/// An item definition from the static catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Type identifier.
    pub type_id: ItemId,
    /// Type name, e.g. "Dense Veldspar".
    pub name: String,
    /// Group name, e.g. "Veldspar".
    pub group: String,
    /// Packaged volume per unit in m³ (>= 0).
    #[serde(default)]
    pub volume: Decimal,
    /// Units consumed by one reprocessing batch (> 0).
    #[serde(default = "default_portion")]
    pub portion: u32,
    /// Reprocessing breakdown of one portion; empty when not reprocessable.
    #[serde(default)]
    pub materials: Vec<ReprocessedMaterial>,
}

impl Item {
    /// Whether the item yields anything when reprocessed.
    pub fn is_reprocessable(&self) -> bool {
        !self.materials.is_empty()
    }
}

/// Static item catalog keyed by type id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Item>", into = "Vec<Item>")]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, Item>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item, returning the previous definition.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.items.insert(item.type_id, item)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in ascending type id order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}

impl FromIterator<Item> for ItemCatalog {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut catalog = ItemCatalog::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}

impl From<Vec<Item>> for ItemCatalog {
    fn from(items: Vec<Item>) -> Self {
        items.into_iter().collect()
    }
}

impl From<ItemCatalog> for Vec<Item> {
    fn from(catalog: ItemCatalog) -> Self {
        catalog.items.into_values().collect()
    }
}

/// Anything able to price an item by identity.
pub trait PriceLookup {
    /// Sell price of one unit, or `None` when unknown.
    fn price(&self, id: ItemId) -> Option<Decimal>;

    /// Sell price of one unit, zero when unknown.
    fn price_or_zero(&self, id: ItemId) -> Decimal {
        self.price(id).unwrap_or(Decimal::ZERO)
    }
}

impl<F> PriceLookup for F
where
    F: Fn(ItemId) -> Option<Decimal>,
{
    fn price(&self, id: ItemId) -> Option<Decimal> {
        self(id)
    }
}

/// Sell prices per unit in ISK.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    prices: BTreeMap<ItemId, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: ItemId, price: Decimal) {
        self.prices.insert(id, price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Decimal)> + '_ {
        self.prices.iter().map(|(id, p)| (*id, *p))
    }
}

impl PriceLookup for PriceTable {
    fn price(&self, id: ItemId) -> Option<Decimal> {
        self.prices.get(&id).copied()
    }
}

impl FromIterator<(ItemId, Decimal)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (ItemId, Decimal)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

/// One mining ledger entry: units of an ore mined by a character on a day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiningEvent {
    /// Observation time (the ledger reports whole days at 00:00).
    pub date: NaiveDateTime,
    /// Ore mined.
    pub type_id: ItemId,
    /// Character that mined it.
    pub character: String,
    /// Units mined.
    pub count: u64,
    /// Sell price of one unit of ore.
    #[serde(default)]
    pub price: Decimal,
    /// Value of the materials from reprocessing one unit with current skills.
    #[serde(default)]
    pub price_reprocessed: Decimal,
    /// Value of the materials from reprocessing one unit at perfect yield.
    #[serde(default)]
    pub price_reprocessed_max: Decimal,
    /// Volume of one unit in m³.
    #[serde(default)]
    pub volume: Decimal,
}

impl MiningEvent {
    /// Ore sell value of the whole entry.
    pub fn value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.count))
    }

    pub fn value_reprocessed(&self) -> Decimal {
        self.price_reprocessed.saturating_mul(Decimal::from(self.count))
    }

    pub fn value_reprocessed_max(&self) -> Decimal {
        self.price_reprocessed_max.saturating_mul(Decimal::from(self.count))
    }

    /// Total volume of the entry in m³.
    pub fn volume_total(&self) -> Decimal {
        self.volume.saturating_mul(Decimal::from(self.count))
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Type or group name is blank.
    #[error("item {0} has an empty name or group")]
    EmptyName(ItemId),
    /// Price must be non-negative.
    #[error("negative price for item {0}")]
    NegativeMoney(ItemId),
    /// Volume must be non-negative.
    #[error("negative volume for item {0}")]
    NegativeVolume(ItemId),
    /// Reprocessing portion must be at least one unit.
    #[error("item {0} has a zero reprocessing portion")]
    ZeroPortion(ItemId),
    /// An item cannot reprocess into itself.
    #[error("item {0} lists itself as a reprocessed material")]
    SelfReference(ItemId),
    /// Each material appears at most once per breakdown.
    #[error("item {item} lists material {material} more than once")]
    DuplicateMaterial { item: ItemId, material: ItemId },
    /// Mining entry without a character.
    #[error("mining event for item {0} has no character")]
    MissingCharacter(ItemId),
}

/// Validate a single item definition.
pub fn validate_item(item: &Item) -> Result<(), ValidationError> {
    if item.name.trim().is_empty() || item.group.trim().is_empty() {
        return Err(ValidationError::EmptyName(item.type_id));
    }
    if item.volume < Decimal::ZERO {
        return Err(ValidationError::NegativeVolume(item.type_id));
    }
    if item.portion == 0 {
        return Err(ValidationError::ZeroPortion(item.type_id));
    }
    let mut seen: BTreeSet<ItemId> = BTreeSet::new();
    for m in &item.materials {
        if m.type_id == item.type_id {
            return Err(ValidationError::SelfReference(item.type_id));
        }
        if !seen.insert(m.type_id) {
            return Err(ValidationError::DuplicateMaterial {
                item: item.type_id,
                material: m.type_id,
            });
        }
    }
    Ok(())
}

/// Validate every item in the catalog.
///
/// Materials that reference unknown items are not errors (the rollups skip
/// them); they are logged and their count is returned.
pub fn validate_catalog(catalog: &ItemCatalog) -> Result<usize, ValidationError> {
    let mut dangling = 0;
    for item in catalog.iter() {
        validate_item(item)?;
        for m in &item.materials {
            if catalog.get(m.type_id).is_none() {
                warn!(item = %item.type_id, material = %m.type_id, "unknown reprocessed material");
                dangling += 1;
            }
        }
    }
    Ok(dangling)
}

/// Validate that no price is negative.
pub fn validate_prices(prices: &PriceTable) -> Result<(), ValidationError> {
    for (id, price) in prices.iter() {
        if price < Decimal::ZERO {
            return Err(ValidationError::NegativeMoney(id));
        }
    }
    Ok(())
}

/// Validate a mining entry.
pub fn validate_event(event: &MiningEvent) -> Result<(), ValidationError> {
    if event.character.trim().is_empty() {
        return Err(ValidationError::MissingCharacter(event.type_id));
    }
    if event.price < Decimal::ZERO
        || event.price_reprocessed < Decimal::ZERO
        || event.price_reprocessed_max < Decimal::ZERO
    {
        return Err(ValidationError::NegativeMoney(event.type_id));
    }
    if event.volume < Decimal::ZERO {
        return Err(ValidationError::NegativeVolume(event.type_id));
    }
    Ok(())
}
