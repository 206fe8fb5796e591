//! Inventory filtering and bundle roll-ups.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{Product, Slab};
use crate::money::{Money, round_money};
use crate::pricing::slab_area_sqft;

/// Where a product bundle sits on the warehouse floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InventoryStage {
    #[default]
    Active,
    Hold,
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlabStatus {
    #[default]
    Available,
    #[serde(rename = "On Hold")]
    OnHold,
    Sold,
}

impl SlabStatus {
    /// Slabs cannot come back once sold.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next || self != Self::Sold
    }
}

/// Query-string filter for product listings. Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub grade: Option<String>,
    pub supplier: Option<String>,
    pub finish: Option<String>,
    pub stage: Option<InventoryStage>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub include_inactive: bool,
}

fn eq_ignore_case(expected: Option<&String>, actual: &str) -> bool {
    expected.is_none_or(|e| e.trim().is_empty() || e.trim().eq_ignore_ascii_case(actual))
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && !product.is_active {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [product.name.as_str(), product.bundle_id.as_str(), product.supplier.as_str()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if !eq_ignore_case(self.category.as_ref(), &product.category)
            || !eq_ignore_case(self.grade.as_ref(), &product.grade)
            || !eq_ignore_case(self.supplier.as_ref(), &product.supplier)
            || !eq_ignore_case(self.finish.as_ref(), &product.finish)
        {
            return false;
        }
        if self.stage.is_some_and(|stage| stage != product.stage) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        true
    }
}

/// Slab counts and available area for one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleSummary {
    pub product_id: uuid::Uuid,
    pub bundle_id: String,
    pub total_slabs: usize,
    pub available: usize,
    pub on_hold: usize,
    pub sold: usize,
    pub available_sqft: Decimal,
}

impl BundleSummary {
    /// Slabs without their own dimensions fall back to the product's nominal
    /// slab size; slabs with neither contribute no area.
    #[must_use]
    pub fn from_slabs(product: &Product, slabs: &[Slab]) -> Self {
        let mut summary = Self {
            product_id: product.id,
            bundle_id: product.bundle_id.clone(),
            total_slabs: 0,
            available: 0,
            on_hold: 0,
            sold: 0,
            available_sqft: Decimal::ZERO,
        };

        for slab in slabs.iter().filter(|s| s.product_id == product.id) {
            summary.total_slabs += 1;
            match slab.status {
                SlabStatus::Available => {
                    summary.available += 1;
                    let length = slab.length.or(product.slab_length);
                    let width = slab.width.or(product.slab_width);
                    if let (Some(l), Some(w)) = (length, width) {
                        let area = slab_area_sqft(l, w).unwrap_or_default();
                        summary.available_sqft = summary.available_sqft.saturating_add(area);
                    }
                }
                SlabStatus::OnHold => summary.on_hold += 1,
                SlabStatus::Sold => summary.sold += 1,
            }
        }
        summary
    }
}

/// Per-category stock roll-up for the inventory dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInventory {
    pub category: String,
    pub products: usize,
    pub stock_quantity: i64,
    pub stock_value: Money,
}

#[must_use]
pub fn inventory_by_category(products: &[Product]) -> Vec<CategoryInventory> {
    let mut buckets: BTreeMap<String, CategoryInventory> = BTreeMap::new();
    for product in products.iter().filter(|p| p.is_active) {
        let entry = buckets.entry(product.category.clone()).or_insert_with(|| CategoryInventory {
            category: product.category.clone(),
            products: 0,
            stock_quantity: 0,
            stock_value: Decimal::ZERO,
        });
        entry.products += 1;
        entry.stock_quantity = entry.stock_quantity.saturating_add(product.stock_quantity);
        let value = round_money(product.price.saturating_mul(Decimal::from(product.stock_quantity)));
        entry.stock_value = entry.stock_value.saturating_add(value);
    }
    buckets.into_values().collect()
}

#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;
