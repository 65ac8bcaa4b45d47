//! Reprocessing rollup: what a selection of items is worth once reprocessed.

use crate::ReprocessSettings;
use ledger_core::{Item, ItemCatalog, ItemId, PriceLookup, ReprocessedMaterial};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// One material produced by reprocessing one portion of a source item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub source: ItemId,
    pub material: ItemId,
    pub name: String,
    /// Units after the skill/efficiency modifier.
    pub quantity: u64,
    /// Units at perfect yield.
    pub quantity_max: u64,
    pub unit_price: Decimal,
}

impl MaterialRow {
    fn new(
        source: ItemId,
        material: &Item,
        line: &ReprocessedMaterial,
        unit_price: Decimal,
        settings: &ReprocessSettings,
    ) -> Self {
        Self {
            source,
            material: material.type_id,
            name: material.name.clone(),
            quantity: settings.left(line.quantity, false),
            quantity_max: settings.left(line.quantity, true),
            unit_price,
        }
    }

    pub fn value(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    pub fn value_max(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity_max))
    }
}

/// Subtotal of one source item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceTotal {
    pub source: ItemId,
    pub name: String,
    /// Sell value of one portion of the source item, unreprocessed.
    pub sell_price: Decimal,
    /// Sum of the material values.
    pub value: Decimal,
    pub value_max: Decimal,
}

impl SourceTotal {
    fn new(item: &Item, unit_price: Decimal) -> Self {
        Self {
            source: item.type_id,
            name: item.name.clone(),
            sell_price: unit_price.saturating_mul(Decimal::from(item.portion)),
            value: Decimal::ZERO,
            value_max: Decimal::ZERO,
        }
    }

    fn add(&mut self, row: &MaterialRow) {
        self.value = self.value.saturating_add(row.value());
        self.value_max = self.value_max.saturating_add(row.value_max());
    }

    /// Positive when reprocessing beats selling the portion as is.
    pub fn value_difference(&self) -> Decimal {
        self.value.saturating_sub(self.sell_price)
    }
}

/// Cross-source total, emitted only when several sources are selected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrandTotal {
    pub sell_price: Decimal,
    pub value: Decimal,
    pub value_max: Decimal,
}

impl GrandTotal {
    fn add(&mut self, total: &SourceTotal) {
        self.sell_price = self.sell_price.saturating_add(total.sell_price);
        self.value = self.value.saturating_add(total.value);
        self.value_max = self.value_max.saturating_add(total.value_max);
    }

    pub fn value_difference(&self) -> Decimal {
        self.value.saturating_sub(self.sell_price)
    }
}

/// One material accumulated across every source that produces it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrandMaterial {
    pub material: ItemId,
    pub name: String,
    pub quantity: u64,
    pub quantity_max: u64,
    pub unit_price: Decimal,
    pub value: Decimal,
    pub value_max: Decimal,
}

impl GrandMaterial {
    fn new(row: &MaterialRow) -> Self {
        Self {
            material: row.material,
            name: row.name.clone(),
            quantity: 0,
            quantity_max: 0,
            unit_price: row.unit_price,
            value: Decimal::ZERO,
            value_max: Decimal::ZERO,
        }
    }

    fn add(&mut self, row: &MaterialRow) {
        self.quantity = self.quantity.saturating_add(row.quantity);
        self.quantity_max = self.quantity_max.saturating_add(row.quantity_max);
        self.value = self.value.saturating_add(row.value());
        self.value_max = self.value_max.saturating_add(row.value_max());
    }
}

/// One output line of the reprocessing rollup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RollupRow {
    Material(MaterialRow),
    SourceTotal(SourceTotal),
    GrandTotal(GrandTotal),
    GrandMaterial(GrandMaterial),
}

impl RollupRow {
    /// Value after the skill/efficiency modifier.
    pub fn value(&self) -> Decimal {
        match self {
            RollupRow::Material(r) => r.value(),
            RollupRow::SourceTotal(t) => t.value,
            RollupRow::GrandTotal(t) => t.value,
            RollupRow::GrandMaterial(g) => g.value,
        }
    }

    pub fn value_max(&self) -> Decimal {
        match self {
            RollupRow::Material(r) => r.value_max(),
            RollupRow::SourceTotal(t) => t.value_max,
            RollupRow::GrandTotal(t) => t.value_max,
            RollupRow::GrandMaterial(g) => g.value_max,
        }
    }

    /// Display name; `None` for the grand total.
    pub fn name(&self) -> Option<&str> {
        match self {
            RollupRow::Material(r) => Some(&r.name),
            RollupRow::SourceTotal(t) => Some(&t.name),
            RollupRow::GrandTotal(_) => None,
            RollupRow::GrandMaterial(g) => Some(&g.name),
        }
    }

    /// Whether the row is a subtotal or total line.
    pub fn is_total(&self) -> bool {
        matches!(self, RollupRow::SourceTotal(_) | RollupRow::GrandTotal(_))
    }
}

/// Build the reprocessing rollup for a selection of source items.
///
/// Sources are visited in ascending id order. Each reprocessable source emits
/// its `SourceTotal` followed by one `MaterialRow` per resolvable material.
/// When more than one source id is selected, the `GrandTotal` and the
/// `GrandMaterial` lines (first-seen order, one per material) follow.
/// Unknown ids, items without a breakdown and unknown materials are skipped.
/// Money saturates at `Decimal::MAX` instead of overflowing.
pub fn aggregate<P>(
    sources: &BTreeSet<ItemId>,
    catalog: &ItemCatalog,
    prices: &P,
    settings: &ReprocessSettings,
) -> Vec<RollupRow>
where
    P: PriceLookup + ?Sized,
{
    let mut rows = Vec::new();
    let mut grand_total = GrandTotal::default();
    let mut grand_materials: Vec<GrandMaterial> = Vec::new();
    let mut grand_index: HashMap<ItemId, usize> = HashMap::new();

    for &id in sources {
        let Some(item) = catalog.get(id) else {
            debug!(source = %id, "unknown source item, skipped");
            continue;
        };
        if !item.is_reprocessable() {
            debug!(source = %id, "source has no reprocessed materials, skipped");
            continue;
        }
        let mut total = SourceTotal::new(item, prices.price_or_zero(id));
        let mut lines = Vec::with_capacity(item.materials.len());
        for line in &item.materials {
            let Some(material) = catalog.get(line.type_id) else {
                debug!(source = %id, material = %line.type_id, "unknown material, skipped");
                continue;
            };
            let price = prices.price_or_zero(material.type_id);
            let row = MaterialRow::new(id, material, line, price, settings);
            total.add(&row);
            let idx = *grand_index.entry(row.material).or_insert_with(|| {
                grand_materials.push(GrandMaterial::new(&row));
                grand_materials.len() - 1
            });
            grand_materials[idx].add(&row);
            lines.push(RollupRow::Material(row));
        }
        grand_total.add(&total);
        rows.push(RollupRow::SourceTotal(total));
        rows.extend(lines);
    }

    if sources.len() > 1 {
        rows.push(RollupRow::GrandTotal(grand_total));
        rows.extend(grand_materials.into_iter().map(RollupRow::GrandMaterial));
    }
    debug!(sources = sources.len(), rows = rows.len(), "reprocessing rollup built");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::PriceTable;
    use proptest::prelude::*;

    const MINERAL: u32 = 34;
    const OTHER: u32 = 35;

    fn item(id: u32, name: &str, materials: &[(u32, u64)]) -> Item {
        Item {
            type_id: ItemId(id),
            name: name.to_string(),
            group: "Group".to_string(),
            volume: Decimal::ONE,
            portion: 1,
            materials: materials
                .iter()
                .map(|&(m, q)| ReprocessedMaterial {
                    type_id: ItemId(m),
                    quantity: q,
                })
                .collect(),
        }
    }

    fn catalog() -> ItemCatalog {
        vec![
            item(1, "Source A", &[(MINERAL, 10), (OTHER, 3)]),
            item(2, "Source B", &[(MINERAL, 20)]),
            item(3, "Empty", &[]),
            item(4, "Dangling", &[(999, 7), (MINERAL, 1)]),
            item(MINERAL, "Tritanium", &[]),
            item(OTHER, "Pyerite", &[]),
        ]
        .into()
    }

    fn prices() -> PriceTable {
        [
            (ItemId(MINERAL), Decimal::new(5, 0)),
            (ItemId(OTHER), Decimal::new(7, 0)),
            (ItemId(1), Decimal::new(60, 0)),
        ]
        .into_iter()
        .collect()
    }

    fn ids(ids: &[u32]) -> BTreeSet<ItemId> {
        ids.iter().map(|&i| ItemId(i)).collect()
    }

    fn grand_materials(rows: &[RollupRow]) -> Vec<&GrandMaterial> {
        rows.iter()
            .filter_map(|r| match r {
                RollupRow::GrandMaterial(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn huge_quantities_saturate_instead_of_overflowing() {
        let catalog: ItemCatalog = vec![
            item(1, "Source A", &[(MINERAL, u64::MAX)]),
            item(2, "Source B", &[(MINERAL, u64::MAX)]),
            item(MINERAL, "Tritanium", &[]),
        ]
        .into();
        let prices: PriceTable = [
            (ItemId(MINERAL), Decimal::new(10_000_000_000, 0)),
            (ItemId(1), Decimal::MAX),
        ]
        .into_iter()
        .collect();
        ledger_core::validate_catalog(&catalog).unwrap();
        ledger_core::validate_prices(&prices).unwrap();

        let rows = aggregate(&ids(&[1, 2]), &catalog, &prices, &ReprocessSettings::perfect());
        assert_eq!(rows.len(), 6);
        for row in &rows {
            assert_eq!(row.value(), Decimal::MAX);
        }
        let RollupRow::GrandTotal(total) = &rows[4] else {
            panic!("expected grand total, got {:?}", rows[4]);
        };
        assert_eq!(total.sell_price, Decimal::MAX);
        assert_eq!(total.value_difference(), Decimal::ZERO);
        assert_eq!(grand_materials(&rows)[0].quantity, u64::MAX);
    }

    #[test]
    fn shared_material_is_deduplicated() {
        let rows = aggregate(&ids(&[1, 2]), &catalog(), &prices(), &ReprocessSettings::perfect());
        let grand = grand_materials(&rows);
        let tritanium: Vec<_> = grand.iter().filter(|g| g.material == ItemId(MINERAL)).collect();
        assert_eq!(tritanium.len(), 1);
        assert_eq!(tritanium[0].value, Decimal::new(150, 0));
        assert_eq!(tritanium[0].quantity, 30);
        assert_eq!(grand.len(), 2);

        let totals: Vec<_> = rows
            .iter()
            .filter(|r| matches!(r, RollupRow::SourceTotal(_)))
            .collect();
        assert_eq!(totals.len(), 2);
        let grand_totals: Vec<_> = rows
            .iter()
            .filter_map(|r| match r {
                RollupRow::GrandTotal(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(grand_totals.len(), 1);
        let material_sum: Decimal = rows
            .iter()
            .filter(|r| matches!(r, RollupRow::Material(_)))
            .map(RollupRow::value)
            .sum();
        // 10*5 + 3*7 + 20*5
        assert_eq!(material_sum, Decimal::new(171, 0));
        assert_eq!(grand_totals[0].value, material_sum);
        assert_eq!(grand_totals[0].sell_price, Decimal::new(60, 0));
    }

    #[test]
    fn row_order_is_totals_then_materials_then_grand() {
        let rows = aggregate(&ids(&[2, 1]), &catalog(), &prices(), &ReprocessSettings::perfect());
        let kinds: Vec<&str> = rows
            .iter()
            .map(|r| match r {
                RollupRow::Material(_) => "m",
                RollupRow::SourceTotal(_) => "t",
                RollupRow::GrandTotal(_) => "G",
                RollupRow::GrandMaterial(_) => "g",
            })
            .collect();
        assert_eq!(kinds, ["t", "m", "m", "t", "m", "G", "g", "g"]);
        assert_eq!(rows[0].name(), Some("Source A"));
        assert_eq!(rows[5].name(), None);
        assert!(rows[0].is_total() && rows[5].is_total() && !rows[6].is_total());
    }

    #[test]
    fn single_source_has_no_grand_rows() {
        let rows = aggregate(&ids(&[1]), &catalog(), &prices(), &ReprocessSettings::perfect());
        assert_eq!(rows.len(), 3);
        assert!(rows
            .iter()
            .all(|r| matches!(r, RollupRow::SourceTotal(_) | RollupRow::Material(_))));
        let RollupRow::SourceTotal(total) = &rows[0] else {
            panic!("expected source total first");
        };
        assert_eq!(total.value, Decimal::new(71, 0));
        assert_eq!(total.value_difference(), Decimal::new(11, 0));
    }

    #[test]
    fn unresolvable_references_are_skipped() {
        let rows = aggregate(&ids(&[3, 4, 77]), &catalog(), &prices(), &ReprocessSettings::perfect());
        // Item 3 is empty and 77 is unknown; item 4 keeps only its known material.
        assert_eq!(rows.len(), 4);
        assert!(matches!(&rows[0], RollupRow::SourceTotal(t) if t.source == ItemId(4)));
        assert!(matches!(&rows[1], RollupRow::Material(m) if m.material == ItemId(MINERAL)));
        // Three ids were selected, so the grand rows are still present.
        assert!(matches!(rows[2], RollupRow::GrandTotal(_)));
        assert!(aggregate(&BTreeSet::new(), &catalog(), &prices(), &ReprocessSettings::perfect()).is_empty());
    }

    #[test]
    fn modifier_applies_before_pricing() {
        let rows = aggregate(&ids(&[1, 2]), &catalog(), &prices(), &ReprocessSettings::default());
        let grand = grand_materials(&rows);
        let tritanium = grand.iter().find(|g| g.material == ItemId(MINERAL)).unwrap();
        // 50% of 10 and 20
        assert_eq!(tritanium.quantity, 15);
        assert_eq!(tritanium.value, Decimal::new(75, 0));
        assert_eq!(tritanium.value_max, Decimal::new(150, 0));
    }

    #[test]
    fn missing_prices_count_as_zero() {
        let rows = aggregate(&ids(&[2]), &catalog(), &PriceTable::new(), &ReprocessSettings::perfect());
        assert!(rows.iter().all(|r| r.value() == Decimal::ZERO));
    }

    proptest! {
        #[test]
        fn grand_material_sums_contributions(q in proptest::collection::vec(1u64..10_000, 2..8),
                                             cents in 1i64..100_000) {
            let mut items: Vec<Item> = q
                .iter()
                .enumerate()
                .map(|(i, &qty)| item(100 + i as u32, "Src", &[(MINERAL, qty)]))
                .collect();
            items.push(item(MINERAL, "Tritanium", &[]));
            let catalog: ItemCatalog = items.into();
            let price = Decimal::new(cents, 2);
            let lookup = move |id: ItemId| (id == ItemId(MINERAL)).then_some(price);
            let sources: BTreeSet<ItemId> = (0..q.len()).map(|i| ItemId(100 + i as u32)).collect();
            let rows = aggregate(&sources, &catalog, &lookup, &ReprocessSettings::perfect());
            let grand = grand_materials(&rows);
            prop_assert_eq!(grand.len(), 1);
            let expected: Decimal = q.iter().map(|&x| price * Decimal::from(x)).sum();
            prop_assert_eq!(grand[0].value, expected);
        }

        #[test]
        fn rollup_is_idempotent(selected in proptest::collection::btree_set(1u32..5, 0..4)) {
            let sources = ids(&selected.into_iter().collect::<Vec<_>>());
            let a = aggregate(&sources, &catalog(), &prices(), &ReprocessSettings::default());
            let b = aggregate(&sources, &catalog(), &prices(), &ReprocessSettings::default());
            prop_assert_eq!(a, b);
        }
    }
}
