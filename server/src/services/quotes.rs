//! Quote lifecycle: creation, pricing, pipeline and approval.
//!
//! DESIGN
//! ======
//! The server never trusts client-sent totals. Every write rebuilds the line
//! items from the catalog (unit price defaults to the product price, slab
//! lines default to the slab's area) and reprices the whole quote through
//! `domain::pricing`.
//!
//! APPROVAL
//! ========
//! A sales rep's quote at or above the approval threshold starts `pending`
//! and needs a caller holding `quotes:approve`. Editing an approved rep quote
//! back over the threshold sends it back to `pending`.
//!
//! Rejected and expired quotes are locked against edits; only their pipeline
//! stage and status can still move.

use domain::inventory::SlabStatus;
use domain::model::{Client, EntityKind, Quote, QuoteLineItem};
use domain::money::Money;
use domain::permissions::{Action, Module, Scope};
use domain::pipeline::{PipelineStage, QuoteStatus, TransitionError, initial_status, is_expired};
use domain::pricing::{PricingError, PricingPolicy, QuoteTotals, compute_totals, line_total, slab_area_sqft};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::activity;
use super::session::{PermissionDenied, SessionUser};
use crate::config::AppConfig;
use crate::state::{AppState, Store};

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("quote not found: {0}")]
    NotFound(Uuid),
    #[error("client not found: {0}")]
    ClientNotFound(Uuid),
    #[error("product not found: {0}")]
    ProductNotFound(Uuid),
    #[error("slab not found: {0}")]
    SlabNotFound(Uuid),
    #[error("line item not found: {0}")]
    LineItemNotFound(Uuid),
    #[error("{0}")]
    Invalid(String),
    #[error("quote is {0} and can no longer be edited")]
    Locked(QuoteStatus),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Denied(#[from] PermissionDenied),
}

// =============================================================================
// INPUTS
// =============================================================================

/// One requested line. Either `quantity` or slab dimensions must be known.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItemInput {
    pub product_id: Uuid,
    pub slab_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    /// Defaults to the product's list price.
    pub unit_price: Option<Money>,
    /// Inches.
    pub length: Option<Decimal>,
    /// Inches.
    pub width: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuote {
    pub client_id: Uuid,
    pub project_name: String,
    pub sales_rep_id: Option<Uuid>,
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub apply_processing_fee: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub valid_until: Option<OffsetDateTime>,
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteUpdate {
    pub client_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub apply_processing_fee: Option<bool>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub valid_until: Option<OffsetDateTime>,
    pub notes: Option<String>,
    pub line_items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteFilter {
    pub stage: Option<PipelineStage>,
    pub status: Option<QuoteStatus>,
    pub client_id: Option<Uuid>,
    pub sales_rep_id: Option<Uuid>,
    /// Matches quote number or project name.
    pub search: Option<String>,
}

impl QuoteFilter {
    fn matches(&self, quote: &Quote) -> bool {
        if self.stage.is_some_and(|s| s != quote.pipeline_stage)
            || self.status.is_some_and(|s| s != quote.status)
            || self.client_id.is_some_and(|c| c != quote.client_id)
            || self.sales_rep_id.is_some_and(|r| r != quote.credited_rep())
        {
            return false;
        }
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .is_none_or(|needle| {
                let needle = needle.to_lowercase();
                quote.quote_number.to_lowercase().contains(&needle) || quote.project_name.to_lowercase().contains(&needle)
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewRequest {
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub apply_processing_fee: bool,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

/// Priced lines and totals for a quote that has not been saved.
#[derive(Debug, Clone, Serialize)]
pub struct QuotePreview {
    pub tax_rate: Decimal,
    pub apply_processing_fee: bool,
    #[serde(flatten)]
    pub totals: QuoteTotals,
    pub requires_approval: bool,
    pub line_items: Vec<QuoteLineItem>,
}

// =============================================================================
// HELPERS
// =============================================================================

fn visible(actor: &SessionUser, quote: &Quote) -> bool {
    actor.scope() == Scope::All || quote.is_owned_by(actor.id)
}

fn policy_for(config: &AppConfig, tax_rate: Option<Decimal>) -> Result<PricingPolicy, QuoteError> {
    match tax_rate {
        Some(rate) => Ok(config.pricing.with_tax_rate(rate)?),
        None => Ok(config.pricing),
    }
}

/// Price one requested line against the catalog.
fn build_line(store: &Store, input: &LineItemInput) -> Result<QuoteLineItem, QuoteError> {
    let product = store.products.get(&input.product_id).ok_or(QuoteError::ProductNotFound(input.product_id))?;
    if !product.is_active {
        return Err(QuoteError::Invalid(format!("product {} is no longer available", product.name)));
    }

    let (length, width) = match input.slab_id {
        Some(slab_id) => {
            let slab = store.slabs.get(&slab_id).ok_or(QuoteError::SlabNotFound(slab_id))?;
            if slab.product_id != product.id {
                return Err(QuoteError::Invalid(format!("slab {} does not belong to {}", slab.slab_number, product.bundle_id)));
            }
            if slab.status == SlabStatus::Sold {
                return Err(QuoteError::Invalid(format!("slab {} is already sold", slab.slab_number)));
            }
            (
                input.length.or(slab.length).or(product.slab_length),
                input.width.or(slab.width).or(product.slab_width),
            )
        }
        None => (input.length, input.width),
    };

    let area = match (length, width) {
        (Some(l), Some(w)) => Some(slab_area_sqft(l, w)?),
        _ => None,
    };
    let quantity = input
        .quantity
        .or(area)
        .ok_or_else(|| QuoteError::Invalid(format!("quantity is required for {}", product.name)))?;
    let unit_price = input.unit_price.unwrap_or(product.price);

    Ok(QuoteLineItem {
        id: Uuid::new_v4(),
        product_id: product.id,
        slab_id: input.slab_id,
        quantity,
        unit_price,
        total_price: line_total(quantity, unit_price)?,
        length,
        width,
        area,
        notes: input.notes.clone(),
    })
}

fn build_lines(store: &Store, inputs: &[LineItemInput]) -> Result<Vec<QuoteLineItem>, QuoteError> {
    inputs.iter().map(|input| build_line(store, input)).collect()
}

fn reprice(quote: &mut Quote, fee_rate: Decimal) -> Result<(), QuoteError> {
    let policy = PricingPolicy::new(quote.tax_rate, fee_rate)?;
    quote.totals = compute_totals(&quote.line_inputs(), quote.apply_processing_fee, policy)?;
    Ok(())
}

/// Send an approved rep quote back for approval once it crosses the threshold.
fn recheck_approval(quote: &mut Quote, actor: &SessionUser, threshold: Money) -> bool {
    let needs_approval = initial_status(quote.totals.total, threshold, actor.role) == QuoteStatus::Pending;
    if needs_approval && quote.status == QuoteStatus::Approved && !actor.can(Module::Quotes, Action::Approve) {
        quote.status = QuoteStatus::Pending;
        quote.approved_by = None;
        quote.approved_at = None;
        return true;
    }
    false
}

/// Client the caller may quote for. Reps only reach clients they carry or created.
fn client_in_scope<'a>(store: &'a Store, actor: &SessionUser, client_id: Uuid) -> Result<&'a Client, QuoteError> {
    store
        .clients
        .get(&client_id)
        .filter(|c| {
            actor.scope() == Scope::All || c.sales_rep_id == Some(actor.id) || c.created_by == Some(actor.id)
        })
        .ok_or(QuoteError::ClientNotFound(client_id))
}

fn validate_rep(store: &Store, rep_id: Uuid) -> Result<(), QuoteError> {
    match store.users.get(&rep_id) {
        Some(r) if r.user.is_active && r.user.role.is_sales() => Ok(()),
        Some(_) => Err(QuoteError::Invalid(format!("user {rep_id} cannot carry quotes"))),
        None => Err(QuoteError::Invalid(format!("unknown sales rep: {rep_id}"))),
    }
}

/// Mutable quote the caller may touch.
fn quote_mut<'a>(store: &'a mut Store, actor: &SessionUser, quote_id: Uuid) -> Result<&'a mut Quote, QuoteError> {
    store
        .quotes
        .get_mut(&quote_id)
        .filter(|q| visible(actor, q))
        .ok_or(QuoteError::NotFound(quote_id))
}

// =============================================================================
// QUERIES
// =============================================================================

/// Quotes visible to the caller, newest first.
///
/// # Errors
///
/// Returns [`QuoteError::Denied`] without `quotes:view`.
pub async fn list_quotes(state: &AppState, actor: &SessionUser, filter: &QuoteFilter) -> Result<Vec<Quote>, QuoteError> {
    actor.require(Module::Quotes, Action::View)?;
    let store = state.store.read().await;
    let mut quotes: Vec<Quote> = store
        .quotes
        .values()
        .filter(|q| visible(actor, q) && filter.matches(q))
        .cloned()
        .collect();
    quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.quote_number.cmp(&a.quote_number)));
    Ok(quotes)
}

/// # Errors
///
/// Returns [`QuoteError::NotFound`] (also for quotes outside the caller's
/// book) or [`QuoteError::Denied`].
pub async fn get_quote(state: &AppState, actor: &SessionUser, quote_id: Uuid) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::View)?;
    let store = state.store.read().await;
    store
        .quotes
        .get(&quote_id)
        .filter(|q| visible(actor, q))
        .cloned()
        .ok_or(QuoteError::NotFound(quote_id))
}

/// Price lines without saving anything.
///
/// # Errors
///
/// Returns catalog lookup and pricing errors, or [`QuoteError::Denied`].
pub async fn preview_quote(
    state: &AppState,
    actor: &SessionUser,
    request: &PreviewRequest,
) -> Result<QuotePreview, QuoteError> {
    actor.require(Module::Quotes, Action::View)?;
    let policy = policy_for(&state.config, request.tax_rate)?;
    let store = state.store.read().await;
    let line_items = build_lines(&store, &request.line_items)?;
    let inputs: Vec<_> = line_items.iter().map(QuoteLineItem::as_line_input).collect();
    let totals = compute_totals(&inputs, request.apply_processing_fee, policy)?;
    Ok(QuotePreview {
        tax_rate: policy.tax_rate,
        apply_processing_fee: request.apply_processing_fee,
        requires_approval: initial_status(totals.total, state.config.approval_threshold, actor.role)
            == QuoteStatus::Pending,
        totals,
        line_items,
    })
}

// =============================================================================
// CREATE / UPDATE / DELETE
// =============================================================================

/// # Errors
///
/// Returns [`QuoteError::Invalid`], catalog lookup errors, pricing errors,
/// or [`QuoteError::Denied`] without `quotes:create`.
pub async fn create_quote(state: &AppState, actor: &SessionUser, input: NewQuote) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Create)?;
    let project_name = input.project_name.trim().to_owned();
    if project_name.is_empty() {
        return Err(QuoteError::Invalid("project name is required".into()));
    }
    let config = &state.config;
    let policy = policy_for(config, input.tax_rate)?;
    let now = OffsetDateTime::now_utc();
    let valid_until = input.valid_until.unwrap_or(now + Duration::days(config.quote_valid_days));
    if valid_until <= now {
        return Err(QuoteError::Invalid("valid_until must be in the future".into()));
    }

    let mut store = state.store.write().await;
    let client = client_in_scope(&store, actor, input.client_id)?;
    let sales_rep_id = match actor.scope() {
        Scope::Own => Some(actor.id),
        Scope::All => input.sales_rep_id.or(client.sales_rep_id),
    };
    let client_name = client.name.clone();
    if let Some(rep) = sales_rep_id.filter(|rep| *rep != actor.id) {
        validate_rep(&store, rep)?;
    }

    let line_items = build_lines(&store, &input.line_items)?;
    let inputs: Vec<_> = line_items.iter().map(QuoteLineItem::as_line_input).collect();
    let totals = compute_totals(&inputs, input.apply_processing_fee, policy)?;
    let status = initial_status(totals.total, config.approval_threshold, actor.role);

    let quote = Quote {
        id: Uuid::new_v4(),
        quote_number: store.next_quote_number(now.year()),
        client_id: input.client_id,
        project_name,
        status,
        pipeline_stage: PipelineStage::Active,
        sales_rep_id,
        created_by: actor.id,
        tax_rate: policy.tax_rate,
        apply_processing_fee: input.apply_processing_fee,
        totals,
        valid_until,
        notes: input.notes,
        approved_by: None,
        approved_at: None,
        approval_notes: None,
        sent_at: None,
        created_at: now,
        updated_at: now,
        line_items,
    };
    store.quotes.insert(quote.id, quote.clone());
    let mut description = format!("Created {} for {client_name}", quote.quote_number);
    if status == QuoteStatus::Pending {
        description.push_str(" (awaiting approval)");
    }
    activity::record(&mut store, Some(actor.id), EntityKind::Quote, Some(quote.id), "created", description);
    tracing::info!(
        quote_id = %quote.id,
        quote_number = %quote.quote_number,
        total = %quote.totals.total,
        status = %quote.status,
        "quote created"
    );
    Ok(quote)
}

/// # Errors
///
/// Returns [`QuoteError::NotFound`], [`QuoteError::Locked`] for rejected or
/// expired quotes, catalog lookup and pricing errors, or
/// [`QuoteError::Denied`] without `quotes:edit`.
pub async fn update_quote(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    update: QuoteUpdate,
) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Edit)?;
    let config = &state.config;
    let mut store = state.store.write().await;

    let status = store
        .quotes
        .get(&quote_id)
        .filter(|q| visible(actor, q))
        .map(|q| q.status)
        .ok_or(QuoteError::NotFound(quote_id))?;
    if status.is_final() {
        return Err(QuoteError::Locked(status));
    }
    if let Some(client_id) = update.client_id {
        client_in_scope(&store, actor, client_id)?;
    }
    let tax_rate = update.tax_rate.map(|rate| policy_for(config, Some(rate))).transpose()?.map(|p| p.tax_rate);
    let line_items = update.line_items.as_deref().map(|inputs| build_lines(&store, inputs)).transpose()?;
    if let Some(name) = &update.project_name {
        if name.trim().is_empty() {
            return Err(QuoteError::Invalid("project name is required".into()));
        }
    }

    let quote = quote_mut(&mut store, actor, quote_id)?;
    if let Some(client_id) = update.client_id {
        quote.client_id = client_id;
    }
    if let Some(name) = update.project_name {
        name.trim().clone_into(&mut quote.project_name);
    }
    if let Some(rate) = tax_rate {
        quote.tax_rate = rate;
    }
    if let Some(fee) = update.apply_processing_fee {
        quote.apply_processing_fee = fee;
    }
    if let Some(valid_until) = update.valid_until {
        quote.valid_until = valid_until;
    }
    if update.notes.is_some() {
        quote.notes = update.notes;
    }
    if let Some(items) = line_items {
        quote.line_items = items;
    }
    reprice(quote, config.pricing.processing_fee_rate)?;
    let resubmitted = recheck_approval(quote, actor, config.approval_threshold);
    quote.updated_at = OffsetDateTime::now_utc();
    let quote = quote.clone();

    let mut description = format!("Updated {}", quote.quote_number);
    if resubmitted {
        description.push_str("; total now needs approval");
    }
    activity::record(&mut store, Some(actor.id), EntityKind::Quote, Some(quote_id), "updated", description);
    Ok(quote)
}

/// # Errors
///
/// Returns [`QuoteError::NotFound`] or [`QuoteError::Denied`] without
/// `quotes:delete`.
pub async fn delete_quote(state: &AppState, actor: &SessionUser, quote_id: Uuid) -> Result<(), QuoteError> {
    actor.require(Module::Quotes, Action::Delete)?;
    let mut store = state.store.write().await;
    quote_mut(&mut store, actor, quote_id)?;
    let quote = store.quotes.remove(&quote_id).ok_or(QuoteError::NotFound(quote_id))?;
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Quote,
        Some(quote_id),
        "deleted",
        format!("Deleted {}", quote.quote_number),
    );
    tracing::info!(quote_id = %quote_id, quote_number = %quote.quote_number, "quote deleted");
    Ok(())
}

/// Append one line and reprice.
///
/// # Errors
///
/// Same as [`update_quote`].
pub async fn add_line_item(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    input: LineItemInput,
) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Edit)?;
    let config = &state.config;
    let mut store = state.store.write().await;
    let line = build_line(&store, &input)?;

    let quote = quote_mut(&mut store, actor, quote_id)?;
    if quote.status.is_final() {
        return Err(QuoteError::Locked(quote.status));
    }
    quote.line_items.push(line);
    reprice(quote, config.pricing.processing_fee_rate)?;
    recheck_approval(quote, actor, config.approval_threshold);
    quote.updated_at = OffsetDateTime::now_utc();
    let quote = quote.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Quote,
        Some(quote_id),
        "line_added",
        format!("Added a line to {}", quote.quote_number),
    );
    Ok(quote)
}

/// Remove one line and reprice.
///
/// # Errors
///
/// Returns [`QuoteError::LineItemNotFound`] in addition to the
/// [`update_quote`] errors.
pub async fn remove_line_item(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    item_id: Uuid,
) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Edit)?;
    let config = &state.config;
    let mut store = state.store.write().await;

    let quote = quote_mut(&mut store, actor, quote_id)?;
    if quote.status.is_final() {
        return Err(QuoteError::Locked(quote.status));
    }
    let before = quote.line_items.len();
    quote.line_items.retain(|item| item.id != item_id);
    if quote.line_items.len() == before {
        return Err(QuoteError::LineItemNotFound(item_id));
    }
    reprice(quote, config.pricing.processing_fee_rate)?;
    quote.updated_at = OffsetDateTime::now_utc();
    let quote = quote.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Quote,
        Some(quote_id),
        "line_removed",
        format!("Removed a line from {}", quote.quote_number),
    );
    Ok(quote)
}

// =============================================================================
// PIPELINE AND APPROVAL
// =============================================================================

/// Move a quote along the sales pipeline.
///
/// # Errors
///
/// Returns [`QuoteError::Transition`] for a disallowed move,
/// [`QuoteError::Invalid`] when winning a quote that is not approved, or
/// [`QuoteError::Denied`] without `quotes:edit`.
pub async fn set_stage(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    stage: PipelineStage,
) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Edit)?;
    let mut store = state.store.write().await;
    let quote = quote_mut(&mut store, actor, quote_id)?;
    let from = quote.pipeline_stage;
    let next = from.transition(stage)?;
    if next == PipelineStage::Won && !matches!(quote.status, QuoteStatus::Approved | QuoteStatus::Sent) {
        return Err(QuoteError::Invalid(format!(
            "quote is {} and must be approved before it can be won",
            quote.status
        )));
    }
    quote.pipeline_stage = next;
    quote.updated_at = OffsetDateTime::now_utc();
    let quote = quote.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Quote,
        Some(quote_id),
        "stage_changed",
        format!("{}: {from} -> {next}", quote.quote_number),
    );
    Ok(quote)
}

/// Change a quote's document status.
///
/// Approving or rejecting through this path needs `quotes:approve` whenever
/// the quote is (or would be) awaiting approval.
///
/// # Errors
///
/// Returns [`QuoteError::Transition`] for a disallowed change or
/// [`QuoteError::Denied`].
pub async fn set_status(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    status: QuoteStatus,
) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Edit)?;
    let threshold = state.config.approval_threshold;
    let mut store = state.store.write().await;
    let quote = quote_mut(&mut store, actor, quote_id)?;
    let from = quote.status;

    let needs_approver = match status {
        QuoteStatus::Rejected => from != QuoteStatus::Rejected,
        QuoteStatus::Approved => {
            from == QuoteStatus::Pending
                || (from != QuoteStatus::Approved
                    && initial_status(quote.totals.total, threshold, actor.role) == QuoteStatus::Pending)
        }
        _ => false,
    };
    if needs_approver {
        actor.require(Module::Quotes, Action::Approve)?;
    }

    let now = OffsetDateTime::now_utc();
    quote.status = from.transition(status)?;
    match status {
        QuoteStatus::Approved if from != QuoteStatus::Approved => {
            quote.approved_by = Some(actor.id);
            quote.approved_at = Some(now);
        }
        QuoteStatus::Sent if from != QuoteStatus::Sent => quote.sent_at = Some(now),
        _ => {}
    }
    quote.updated_at = now;
    let quote = quote.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Quote,
        Some(quote_id),
        "status_changed",
        format!("{}: {from} -> {status}", quote.quote_number),
    );
    Ok(quote)
}

async fn decide(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    outcome: QuoteStatus,
    notes: Option<String>,
) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Approve)?;
    let mut store = state.store.write().await;
    let quote = quote_mut(&mut store, actor, quote_id)?;
    let from = quote.status;
    let awaiting = match outcome {
        QuoteStatus::Approved => matches!(from, QuoteStatus::Draft | QuoteStatus::Pending),
        _ => from == QuoteStatus::Pending,
    };
    if !awaiting {
        return Err(TransitionError::Status { from, to: outcome }.into());
    }
    quote.status = outcome;
    let now = OffsetDateTime::now_utc();
    quote.approved_by = Some(actor.id);
    quote.approved_at = (outcome == QuoteStatus::Approved).then_some(now);
    quote.approval_notes = notes;
    quote.updated_at = now;
    let quote = quote.clone();

    let action = if outcome == QuoteStatus::Approved { "approved" } else { "rejected" };
    let mut description = format!("{} {action} by {}", quote.quote_number, actor.display_name);
    if let Some(notes) = &quote.approval_notes {
        description.push_str(": ");
        description.push_str(notes);
    }
    activity::record(&mut store, Some(actor.id), EntityKind::Quote, Some(quote_id), action, description);
    tracing::info!(quote_id = %quote_id, approver = %actor.id, %outcome, "quote decision recorded");
    Ok(quote)
}

/// # Errors
///
/// Returns [`QuoteError::Transition`] unless the quote is awaiting approval
/// or a draft, or [`QuoteError::Denied`] without `quotes:approve`.
pub async fn approve_quote(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    notes: Option<String>,
) -> Result<Quote, QuoteError> {
    decide(state, actor, quote_id, QuoteStatus::Approved, notes).await
}

/// # Errors
///
/// Returns [`QuoteError::Transition`] unless the quote is pending, or
/// [`QuoteError::Denied`] without `quotes:approve`.
pub async fn reject_quote(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    notes: Option<String>,
) -> Result<Quote, QuoteError> {
    decide(state, actor, quote_id, QuoteStatus::Rejected, notes).await
}

/// Reassign the credited rep. Sales reps cannot reassign.
///
/// # Errors
///
/// Returns [`QuoteError::Invalid`] for an unusable rep or
/// [`QuoteError::Denied`].
pub async fn set_sales_rep(
    state: &AppState,
    actor: &SessionUser,
    quote_id: Uuid,
    sales_rep_id: Option<Uuid>,
) -> Result<Quote, QuoteError> {
    actor.require(Module::Quotes, Action::Edit)?;
    if actor.scope() == Scope::Own {
        return Err(QuoteError::Invalid("sales reps cannot reassign quotes".into()));
    }
    let mut store = state.store.write().await;
    if let Some(rep) = sales_rep_id {
        validate_rep(&store, rep)?;
    }
    let quote = quote_mut(&mut store, actor, quote_id)?;
    quote.sales_rep_id = sales_rep_id;
    quote.updated_at = OffsetDateTime::now_utc();
    let quote = quote.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Quote,
        Some(quote_id),
        "reassigned",
        format!("Reassigned {}", quote.quote_number),
    );
    Ok(quote)
}

// =============================================================================
// MAINTENANCE
// =============================================================================

/// Mark every open quote past its validity date as expired.
pub(crate) fn expire_stale(store: &mut Store, now: OffsetDateTime) -> Vec<Uuid> {
    let mut expired = Vec::new();
    for quote in store.quotes.values_mut() {
        if is_expired(quote.valid_until, now, quote.status) && quote.status.can_transition_to(QuoteStatus::Expired) {
            quote.status = QuoteStatus::Expired;
            quote.updated_at = now;
            expired.push((quote.id, quote.quote_number.clone()));
        }
    }
    for (id, number) in &expired {
        activity::record(store, None, EntityKind::Quote, Some(*id), "expired", format!("{number} expired"));
    }
    expired.into_iter().map(|(id, _)| id).collect()
}

/// Reprice every quote from its stored lines. Returns how many totals changed.
pub(crate) fn recalculate_all(store: &mut Store, fee_rate: Decimal) -> Result<usize, QuoteError> {
    let mut changed = 0;
    for quote in store.quotes.values_mut() {
        let before = quote.totals;
        for item in &mut quote.line_items {
            item.total_price = line_total(item.quantity, item.unit_price)?;
        }
        reprice(quote, fee_rate)?;
        if quote.totals != before {
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
#[path = "quotes_test.rs"]
mod tests;
