//! Shared records and business rules for the stone distribution CRM.
//!
//! This crate owns the pricing math, the role/permission matrix, and the
//! quote lifecycle rules used by both the REST service and the CLI. Keeping
//! them here means a quote priced in the terminal and a quote priced by the
//! server always agree to the cent.

pub mod analytics;
pub mod inventory;
pub mod model;
pub mod money;
pub mod permissions;
pub mod pipeline;
pub mod pricing;

pub use money::Money;
pub use permissions::{Action, Module, PermissionSet, Role};
pub use pipeline::{PipelineStage, QuoteStatus};
pub use pricing::{PricingPolicy, QuoteTotals};
