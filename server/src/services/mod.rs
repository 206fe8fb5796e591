//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic, permission checks and the audit
//! trail so route handlers can stay focused on protocol translation and
//! auth plumbing. Every service takes the authenticated `SessionUser` and
//! checks it against `domain::permissions` before touching the store.

pub mod activity;
pub mod admin;
pub mod auth;
pub mod clients;
pub mod inventory;
pub mod quotes;
pub mod reports;
pub mod session;
pub mod showroom;
pub mod users;
