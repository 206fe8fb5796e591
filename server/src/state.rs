//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! Business records live in a single in-memory `Store` behind one
//! `RwLock`, so a service that touches several tables (a quote write checks
//! the client, prices against products and appends an activity) does it
//! under one write guard. Sessions sit in their own lock because every
//! authenticated request reads them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::model::{Activity, Client, Product, Quote, ShowroomVisit, Slab, User};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::rate_limit::LoginThrottle;

// =============================================================================
// RECORDS
// =============================================================================

/// A user plus the salted password hash that never leaves the server.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    /// argon2id PHC string.
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

/// All business records.
#[derive(Debug, Default)]
pub struct Store {
    pub users: HashMap<Uuid, UserRecord>,
    pub clients: HashMap<Uuid, Client>,
    pub products: HashMap<Uuid, Product>,
    pub slabs: HashMap<Uuid, Slab>,
    pub quotes: HashMap<Uuid, Quote>,
    pub visits: HashMap<Uuid, ShowroomVisit>,
    /// Oldest first, capped at `activity::MAX_ACTIVITIES`.
    pub activities: VecDeque<Activity>,
    /// Last issued quote sequence per calendar year.
    pub quote_sequences: HashMap<i32, u32>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next `Q-YYYY-NNNN` number for `year`.
    pub fn next_quote_number(&mut self, year: i32) -> String {
        let seq = self.quote_sequences.entry(year).or_insert(0);
        *seq += 1;
        domain::model::format_quote_number(year, *seq)
    }

    #[must_use]
    pub fn find_user_by_username(&self, username: &str) -> Option<&UserRecord> {
        let wanted = username.trim();
        self.users
            .values()
            .find(|r| r.user.username.eq_ignore_ascii_case(wanted))
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<RwLock<Store>>,
    /// Session token -> session.
    pub sessions: Arc<RwLock<HashMap<String, Session>>>,
    pub login_throttle: LoginThrottle,
    pub started_at: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, store: Store) -> Self {
        let login_throttle =
            LoginThrottle::new(config.login_max_failures, Duration::from_secs(config.login_lockout_secs));
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(store)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            login_throttle,
            started_at: Instant::now(),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
