//! Records exchanged over the REST API.
//!
//! These mirror the JSON shapes the service reads and writes. Money fields
//! are decimals (serialized as strings) and timestamps are RFC 3339.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::inventory::{InventoryStage, SlabStatus};
use crate::money::Money;
use crate::permissions::{PermissionOverrides, Role};
use crate::pipeline::{PipelineStage, QuoteStatus};
use crate::pricing::{LineInput, QuoteTotals};

pub const CATEGORIES: &[&str] = &["marble", "granite", "quartz", "travertine", "porcelain", "counter_fixtures"];
pub const GRADES: &[&str] = &["premium", "standard", "economy"];
pub const FINISHES: &[&str] = &["Polished", "Leather", "Brushed", "Matte"];
pub const THICKNESSES: &[&str] = &["2cm", "3cm"];

// =============================================================================
// USERS AND CLIENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "PermissionOverrides::is_empty")]
    pub permissions: PermissionOverrides,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub sales_rep_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// INVENTORY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub bundle_id: String,
    pub name: String,
    pub description: Option<String>,
    pub supplier: String,
    pub category: String,
    pub grade: String,
    pub thickness: String,
    pub finish: String,
    pub price: Money,
    pub wholesale_price: Option<Money>,
    pub stock_quantity: i64,
    pub unit: String,
    pub location: Option<String>,
    #[serde(default)]
    pub stage: InventoryStage,
    pub slab_length: Option<Decimal>,
    pub slab_width: Option<Decimal>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    pub id: Uuid,
    pub product_id: Uuid,
    pub bundle_id: String,
    pub slab_number: String,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    #[serde(default)]
    pub status: SlabStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// QUOTES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub slab_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub total_price: Money,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub area: Option<Decimal>,
    pub notes: Option<String>,
}

impl QuoteLineItem {
    #[must_use]
    pub fn as_line_input(&self) -> LineInput {
        LineInput { quantity: self.quantity, unit_price: self.unit_price }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub quote_number: String,
    pub client_id: Uuid,
    pub project_name: String,
    pub status: QuoteStatus,
    pub pipeline_stage: PipelineStage,
    pub sales_rep_id: Option<Uuid>,
    pub created_by: Uuid,
    pub tax_rate: Decimal,
    pub apply_processing_fee: bool,
    #[serde(flatten)]
    pub totals: QuoteTotals,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_until: OffsetDateTime,
    pub notes: Option<String>,
    pub approved_by: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    pub approval_notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub sent_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub line_items: Vec<QuoteLineItem>,
}

impl Quote {
    /// Owned by `user_id` either as creator or as assigned rep.
    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.created_by == user_id || self.sales_rep_id == Some(user_id)
    }

    /// Rep credited with the quote: the assignee, else the creator.
    #[must_use]
    pub fn credited_rep(&self) -> Uuid {
        self.sales_rep_id.unwrap_or(self.created_by)
    }

    #[must_use]
    pub fn line_inputs(&self) -> Vec<LineInput> {
        self.line_items.iter().map(QuoteLineItem::as_line_input).collect()
    }
}

/// `Q-<year>-<seq>` with the sequence zero-padded to four digits.
#[must_use]
pub fn format_quote_number(year: i32, sequence: u32) -> String {
    format!("Q-{year}-{sequence:04}")
}

// =============================================================================
// SHOWROOM AND ACTIVITY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    #[default]
    Pending,
    Scheduled,
    Completed,
    Cancelled,
}

impl VisitStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowroomVisit {
    pub id: Uuid,
    pub client_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub preferred_date: OffsetDateTime,
    pub status: VisitStatus,
    pub assigned_to: Option<Uuid>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Quote,
    Client,
    Product,
    Slab,
    User,
    ShowroomVisit,
    System,
}

/// Audit-trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub entity_type: EntityKind,
    pub entity_id: Option<Uuid>,
    pub action: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
