//! Display names for series.

use crate::rollup::{CategoryName, SeriesKey};
use ledger_core::{Item, ItemCatalog, ItemId};
use serde::{Deserialize, Serialize};

/// Name templates. `{group}` and `{variant}` are substituted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesLabels {
    pub grand_total: String,
    pub group_total: String,
    /// Ore whose type name equals its group, e.g. plain "Veldspar".
    pub basic: String,
    /// Ore variant, e.g. "Dense Veldspar".
    pub variant: String,
}

impl Default for SeriesLabels {
    fn default() -> Self {
        Self {
            grand_total: "Grand Total".to_string(),
            group_total: "{group} Total".to_string(),
            basic: "{group} (Basic)".to_string(),
            variant: "{group} ({variant})".to_string(),
        }
    }
}

impl SeriesLabels {
    pub fn label(&self, key: &SeriesKey) -> String {
        match key {
            SeriesKey::GrandTotal => self.grand_total.clone(),
            SeriesKey::GroupTotal(group) => self.group_total.replace("{group}", group),
            SeriesKey::Leaf { name, .. } => name.clone(),
        }
    }

    /// Leaf and group names of a catalog item.
    ///
    /// The variant is the type name with the group name removed.
    pub fn category_name(&self, item: &Item) -> CategoryName {
        let leaf = if item.name == item.group {
            self.basic.replace("{group}", &item.group)
        } else {
            let variant = item.name.replace(&item.group, "");
            self.variant
                .replace("{group}", &item.group)
                .replace("{variant}", variant.trim())
        };
        CategoryName {
            group: Some(item.group.clone()),
            leaf,
        }
    }

    /// Resolver for [`crate::aggregate`]; unknown ids resolve to `None`.
    pub fn resolver<'a>(
        &'a self,
        catalog: &'a ItemCatalog,
    ) -> impl Fn(ItemId) -> Option<CategoryName> + 'a {
        move |id| catalog.get(id).map(|item| self.category_name(item))
    }
}
