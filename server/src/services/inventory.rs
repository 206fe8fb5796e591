//! Products, slabs and stock roll-ups.
//!
//! DESIGN
//! ======
//! A product is a bundle of one material; slabs are the physical pieces in
//! that bundle. Deleting a product that appears on any quote only
//! deactivates it, so historical quotes keep resolving their lines.

use domain::inventory::{BundleSummary, CategoryInventory, InventoryStage, ProductFilter, SlabStatus, inventory_by_category};
use domain::model::{CATEGORIES, EntityKind, GRADES, Product, Slab};
use domain::money::{Money, round_money};
use domain::permissions::{Action, Module};
use domain::pricing::{MAX_DIMENSION_IN, MAX_UNIT_PRICE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::activity;
use super::session::{PermissionDenied, SessionUser};
use crate::state::AppState;

/// Products at or below this many units show up as low stock.
const LOW_STOCK_THRESHOLD: i64 = 5;
const MAX_STOCK_QUANTITY: i64 = 1_000_000;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("product not found: {0}")]
    NotFound(Uuid),
    #[error("slab not found: {0}")]
    SlabNotFound(Uuid),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("slab cannot move from {from:?} to {to:?}")]
    Transition { from: SlabStatus, to: SlabStatus },
    #[error(transparent)]
    Denied(#[from] PermissionDenied),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub bundle_id: String,
    pub name: String,
    pub description: Option<String>,
    pub supplier: String,
    pub category: String,
    pub grade: String,
    #[serde(default = "default_thickness")]
    pub thickness: String,
    #[serde(default = "default_finish")]
    pub finish: String,
    pub price: Money,
    pub wholesale_price: Option<Money>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub location: Option<String>,
    pub slab_length: Option<Decimal>,
    pub slab_width: Option<Decimal>,
}

fn default_thickness() -> String {
    "3cm".into()
}

fn default_finish() -> String {
    "Polished".into()
}

fn default_unit() -> String {
    "sqft".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub supplier: Option<String>,
    pub category: Option<String>,
    pub grade: Option<String>,
    pub thickness: Option<String>,
    pub finish: Option<String>,
    pub price: Option<Money>,
    pub wholesale_price: Option<Money>,
    pub stock_quantity: Option<i64>,
    pub location: Option<String>,
    pub stage: Option<InventoryStage>,
    pub slab_length: Option<Decimal>,
    pub slab_width: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSlab {
    pub slab_number: String,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub slabs: BundleSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub total_products: usize,
    pub active_products: usize,
    pub total_slabs: usize,
    pub available_slabs: usize,
    pub total_stock_value: Money,
    pub categories: Vec<CategoryInventory>,
    pub low_stock: Vec<Product>,
}

/// What a delete actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    Deactivated,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn normalize_choice(value: &str, allowed: &[&str], field: &str) -> Result<String, InventoryError> {
    let wanted = value.trim();
    allowed
        .iter()
        .find(|c| c.eq_ignore_ascii_case(wanted))
        .map(|c| (*c).to_owned())
        .ok_or_else(|| InventoryError::Invalid(format!("unknown {field}: {wanted} (expected one of {})", allowed.join(", "))))
}

fn require_non_negative(value: Money, field: &str) -> Result<Money, InventoryError> {
    if value.is_sign_negative() {
        return Err(InventoryError::Invalid(format!("{field} must not be negative")));
    }
    if value > MAX_UNIT_PRICE {
        return Err(InventoryError::Invalid(format!("{field} must not exceed {MAX_UNIT_PRICE}")));
    }
    Ok(round_money(value))
}

fn require_dimension(value: Option<Decimal>, field: &str) -> Result<Option<Decimal>, InventoryError> {
    match value {
        Some(d) if d <= Decimal::ZERO => Err(InventoryError::Invalid(format!("{field} must be positive"))),
        Some(d) if d > MAX_DIMENSION_IN => {
            Err(InventoryError::Invalid(format!("{field} must not exceed {MAX_DIMENSION_IN} inches")))
        }
        other => Ok(other),
    }
}

fn clamp_stock(quantity: i64) -> i64 {
    quantity.clamp(0, MAX_STOCK_QUANTITY)
}

fn require_text(value: &str, field: &str) -> Result<String, InventoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::Invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}

/// Validate a new product's fields. Uniqueness of the bundle id is the
/// caller's job since it needs the store.
pub(crate) fn build_product(input: NewProduct, now: OffsetDateTime) -> Result<Product, InventoryError> {
    Ok(Product {
        id: Uuid::new_v4(),
        bundle_id: require_text(&input.bundle_id, "bundle_id")?,
        name: require_text(&input.name, "name")?,
        description: input.description,
        supplier: require_text(&input.supplier, "supplier")?,
        category: normalize_choice(&input.category, CATEGORIES, "category")?,
        grade: normalize_choice(&input.grade, GRADES, "grade")?,
        thickness: input.thickness.trim().to_owned(),
        finish: input.finish.trim().to_owned(),
        price: require_non_negative(input.price, "price")?,
        wholesale_price: input.wholesale_price.map(|w| require_non_negative(w, "wholesale_price")).transpose()?,
        stock_quantity: clamp_stock(input.stock_quantity),
        unit: input.unit,
        location: input.location,
        stage: InventoryStage::Active,
        slab_length: require_dimension(input.slab_length, "slab_length")?,
        slab_width: require_dimension(input.slab_width, "slab_width")?,
        is_active: true,
        created_at: now,
    })
}

/// A fresh available slab under `product`.
pub(crate) fn build_slab(product: &Product, input: NewSlab, now: OffsetDateTime) -> Result<Slab, InventoryError> {
    Ok(Slab {
        id: Uuid::new_v4(),
        product_id: product.id,
        bundle_id: product.bundle_id.clone(),
        slab_number: require_text(&input.slab_number, "slab_number")?,
        length: require_dimension(input.length, "length")?,
        width: require_dimension(input.width, "width")?,
        status: SlabStatus::Available,
        location: input.location,
        notes: input.notes,
        created_at: now,
    })
}

// =============================================================================
// PRODUCTS
// =============================================================================

/// Products matching `filter`, sorted by name.
///
/// # Errors
///
/// Returns [`InventoryError::Denied`] without `inventory:view`.
pub async fn list_products(
    state: &AppState,
    actor: &SessionUser,
    filter: &ProductFilter,
) -> Result<Vec<Product>, InventoryError> {
    actor.require(Module::Inventory, Action::View)?;
    let store = state.store.read().await;
    let mut products: Vec<Product> = store.products.values().filter(|p| filter.matches(p)).cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.bundle_id.cmp(&b.bundle_id)));
    Ok(products)
}

/// # Errors
///
/// Returns [`InventoryError::NotFound`] or [`InventoryError::Denied`].
pub async fn get_product(
    state: &AppState,
    actor: &SessionUser,
    product_id: Uuid,
) -> Result<ProductDetail, InventoryError> {
    actor.require(Module::Inventory, Action::View)?;
    let store = state.store.read().await;
    let product = store.products.get(&product_id).cloned().ok_or(InventoryError::NotFound(product_id))?;
    let slabs: Vec<Slab> = store.slabs.values().filter(|s| s.product_id == product_id).cloned().collect();
    let summary = BundleSummary::from_slabs(&product, &slabs);
    Ok(ProductDetail { product, slabs: summary })
}

/// # Errors
///
/// Returns [`InventoryError::Invalid`], [`InventoryError::Conflict`] for a
/// reused bundle id, or [`InventoryError::Denied`].
pub async fn create_product(
    state: &AppState,
    actor: &SessionUser,
    input: NewProduct,
) -> Result<Product, InventoryError> {
    actor.require(Module::Inventory, Action::Create)?;
    let product = build_product(input, OffsetDateTime::now_utc())?;

    let mut store = state.store.write().await;
    if store.products.values().any(|p| p.bundle_id.eq_ignore_ascii_case(&product.bundle_id)) {
        return Err(InventoryError::Conflict(format!("bundle id already exists: {}", product.bundle_id)));
    }
    store.products.insert(product.id, product.clone());
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Product,
        Some(product.id),
        "created",
        format!("Added product {} ({})", product.name, product.bundle_id),
    );
    Ok(product)
}

/// # Errors
///
/// Returns [`InventoryError::NotFound`], [`InventoryError::Invalid`] or
/// [`InventoryError::Denied`].
pub async fn update_product(
    state: &AppState,
    actor: &SessionUser,
    product_id: Uuid,
    update: ProductUpdate,
) -> Result<Product, InventoryError> {
    actor.require(Module::Inventory, Action::Edit)?;

    let category = update.category.as_deref().map(|c| normalize_choice(c, CATEGORIES, "category")).transpose()?;
    let grade = update.grade.as_deref().map(|g| normalize_choice(g, GRADES, "grade")).transpose()?;
    let price = update.price.map(|p| require_non_negative(p, "price")).transpose()?;
    let wholesale = update.wholesale_price.map(|w| require_non_negative(w, "wholesale_price")).transpose()?;
    let slab_length = require_dimension(update.slab_length, "slab_length")?;
    let slab_width = require_dimension(update.slab_width, "slab_width")?;

    let mut store = state.store.write().await;
    let product = store.products.get_mut(&product_id).ok_or(InventoryError::NotFound(product_id))?;
    if let Some(name) = update.name {
        product.name = require_text(&name, "name")?;
    }
    if let Some(supplier) = update.supplier {
        product.supplier = require_text(&supplier, "supplier")?;
    }
    if update.description.is_some() {
        product.description = update.description;
    }
    if let Some(category) = category {
        product.category = category;
    }
    if let Some(grade) = grade {
        product.grade = grade;
    }
    if let Some(thickness) = update.thickness {
        product.thickness = thickness.trim().to_owned();
    }
    if let Some(finish) = update.finish {
        product.finish = finish.trim().to_owned();
    }
    if let Some(price) = price {
        product.price = price;
    }
    if wholesale.is_some() {
        product.wholesale_price = wholesale;
    }
    if let Some(qty) = update.stock_quantity {
        product.stock_quantity = clamp_stock(qty);
    }
    if update.location.is_some() {
        product.location = update.location;
    }
    if let Some(stage) = update.stage {
        product.stage = stage;
    }
    if slab_length.is_some() {
        product.slab_length = slab_length;
    }
    if slab_width.is_some() {
        product.slab_width = slab_width;
    }
    if let Some(active) = update.is_active {
        product.is_active = active;
    }
    let product = product.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Product,
        Some(product_id),
        "updated",
        format!("Updated product {}", product.name),
    );
    Ok(product)
}

/// Remove a product and its slabs, or only deactivate it when a quote still
/// references it.
///
/// # Errors
///
/// Returns [`InventoryError::NotFound`] or [`InventoryError::Denied`].
pub async fn delete_product(
    state: &AppState,
    actor: &SessionUser,
    product_id: Uuid,
) -> Result<DeleteOutcome, InventoryError> {
    actor.require(Module::Inventory, Action::Delete)?;
    let mut store = state.store.write().await;
    if !store.products.contains_key(&product_id) {
        return Err(InventoryError::NotFound(product_id));
    }
    let quoted = store
        .quotes
        .values()
        .any(|q| q.line_items.iter().any(|item| item.product_id == product_id));

    let (outcome, name) = if quoted {
        let product = store.products.get_mut(&product_id).ok_or(InventoryError::NotFound(product_id))?;
        product.is_active = false;
        (DeleteOutcome::Deactivated, product.name.clone())
    } else {
        let product = store.products.remove(&product_id).ok_or(InventoryError::NotFound(product_id))?;
        store.slabs.retain(|_, s| s.product_id != product_id);
        (DeleteOutcome::Deleted, product.name)
    };
    let action = match outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::Deactivated => "deactivated",
    };
    activity::record(&mut store, Some(actor.id), EntityKind::Product, Some(product_id), action, format!("Removed product {name}"));
    Ok(outcome)
}

// =============================================================================
// SLABS
// =============================================================================

/// # Errors
///
/// Returns [`InventoryError::NotFound`] or [`InventoryError::Denied`].
pub async fn list_slabs(state: &AppState, actor: &SessionUser, product_id: Uuid) -> Result<Vec<Slab>, InventoryError> {
    actor.require(Module::Inventory, Action::View)?;
    let store = state.store.read().await;
    if !store.products.contains_key(&product_id) {
        return Err(InventoryError::NotFound(product_id));
    }
    let mut slabs: Vec<Slab> = store.slabs.values().filter(|s| s.product_id == product_id).cloned().collect();
    slabs.sort_by(|a, b| a.slab_number.cmp(&b.slab_number));
    Ok(slabs)
}

/// # Errors
///
/// Returns [`InventoryError::NotFound`], [`InventoryError::Invalid`],
/// [`InventoryError::Conflict`] for a reused slab number, or
/// [`InventoryError::Denied`].
pub async fn add_slab(
    state: &AppState,
    actor: &SessionUser,
    product_id: Uuid,
    input: NewSlab,
) -> Result<Slab, InventoryError> {
    actor.require(Module::Inventory, Action::Create)?;
    let mut store = state.store.write().await;
    let product = store.products.get(&product_id).ok_or(InventoryError::NotFound(product_id))?;
    let slab = build_slab(product, input, OffsetDateTime::now_utc())?;
    if store.slabs.values().any(|s| s.product_id == product_id && s.slab_number == slab.slab_number) {
        return Err(InventoryError::Conflict(format!(
            "slab {} already exists in {}",
            slab.slab_number, slab.bundle_id
        )));
    }
    store.slabs.insert(slab.id, slab.clone());
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Slab,
        Some(slab.id),
        "created",
        format!("Added slab {} to {}", slab.slab_number, slab.bundle_id),
    );
    Ok(slab)
}

/// # Errors
///
/// Returns [`InventoryError::SlabNotFound`], [`InventoryError::Transition`]
/// for a sold slab, or [`InventoryError::Denied`].
pub async fn set_slab_status(
    state: &AppState,
    actor: &SessionUser,
    slab_id: Uuid,
    status: SlabStatus,
) -> Result<Slab, InventoryError> {
    actor.require(Module::Inventory, Action::Edit)?;
    let mut store = state.store.write().await;
    let slab = store.slabs.get_mut(&slab_id).ok_or(InventoryError::SlabNotFound(slab_id))?;
    if !slab.status.can_transition_to(status) {
        return Err(InventoryError::Transition { from: slab.status, to: status });
    }
    let from = slab.status;
    slab.status = status;
    let slab = slab.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Slab,
        Some(slab_id),
        "status_changed",
        format!("Slab {} of {}: {from:?} -> {status:?}", slab.slab_number, slab.bundle_id),
    );
    Ok(slab)
}

// =============================================================================
// SUMMARY
// =============================================================================

/// # Errors
///
/// Returns [`InventoryError::Denied`] without `inventory:view`.
pub async fn inventory_summary(state: &AppState, actor: &SessionUser) -> Result<InventorySummary, InventoryError> {
    actor.require(Module::Inventory, Action::View)?;
    let store = state.store.read().await;
    let products: Vec<Product> = store.products.values().cloned().collect();
    let categories = inventory_by_category(&products);
    let mut low_stock: Vec<Product> = products
        .iter()
        .filter(|p| p.is_active && p.stock_quantity <= LOW_STOCK_THRESHOLD)
        .cloned()
        .collect();
    low_stock.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then_with(|| a.name.cmp(&b.name)));

    Ok(InventorySummary {
        total_products: products.len(),
        active_products: products.iter().filter(|p| p.is_active).count(),
        total_slabs: store.slabs.len(),
        available_slabs: store.slabs.values().filter(|s| s.status == SlabStatus::Available).count(),
        total_stock_value: categories.iter().map(|c| c.stock_value).sum(),
        categories,
        low_stock,
    })
}

#[cfg(test)]
#[path = "inventory_test.rs"]
mod tests;
