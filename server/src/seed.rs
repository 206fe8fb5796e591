//! Startup seed data.
//!
//! Records live in memory only, so a fresh process is empty until a YAML
//! seed file is loaded. Passwords in the file are plaintext and are hashed
//! here; they never reach the store as written.

use std::path::{Path, PathBuf};

use domain::model::{Client, User};
use domain::permissions::{PermissionOverrides, Role};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::auth::hash_password;
use crate::services::inventory::{self, InventoryError, NewProduct, NewSlab};
use crate::services::users::{self, UserError};
use crate::state::{Store, UserRecord};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid seed yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("seed user {username}: {source}")]
    User {
        username: String,
        #[source]
        source: UserError,
    },
    #[error("seed product {bundle_id}: {source}")]
    Product {
        bundle_id: String,
        #[source]
        source: InventoryError,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub clients: Vec<SeedClient>,
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub permissions: PermissionOverrides,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SeedClient {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Username of the assigned rep.
    pub sales_rep: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    #[serde(flatten)]
    pub product: NewProduct,
    #[serde(default)]
    pub slabs: Vec<NewSlab>,
}

/// Read and load the seed file at `path`.
///
/// # Errors
///
/// Returns [`SeedError`] when the file is unreadable or any record is invalid.
pub fn load(path: &Path) -> Result<Store, SeedError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read { path: path.to_owned(), source })?;
    let store = parse(&raw)?;
    tracing::info!(
        path = %path.display(),
        users = store.users.len(),
        clients = store.clients.len(),
        products = store.products.len(),
        slabs = store.slabs.len(),
        "seed data loaded"
    );
    Ok(store)
}

/// Build a store from seed YAML.
///
/// # Errors
///
/// Returns [`SeedError`] for malformed YAML, invalid records, duplicate
/// usernames or bundle ids, and clients naming an unknown rep.
pub fn parse(yaml: &str) -> Result<Store, SeedError> {
    let file: SeedFile = serde_yaml::from_str(yaml)?;
    let now = OffsetDateTime::now_utc();
    let mut store = Store::new();

    for seed in file.users {
        let username = seed.username.trim().to_owned();
        let wrap = |source| SeedError::User { username: username.clone(), source };
        if username.is_empty() {
            return Err(SeedError::Invalid("seed user without a username".into()));
        }
        users::validate_email(&seed.email).map_err(wrap)?;
        users::validate_password(&seed.password).map_err(wrap)?;
        let password_hash = hash_password(&seed.password).map_err(|e| wrap(UserError::from(e)))?;
        if store.find_user_by_username(&username).is_some() {
            return Err(SeedError::Invalid(format!("duplicate seed user: {username}")));
        }
        let user = User {
            id: Uuid::new_v4(),
            username,
            email: seed.email.trim().to_owned(),
            first_name: seed.first_name.trim().to_owned(),
            last_name: seed.last_name.trim().to_owned(),
            role: seed.role,
            is_active: seed.is_active,
            permissions: seed.permissions,
            last_login: None,
            created_at: now,
        };
        store.users.insert(user.id, UserRecord { user, password_hash });
    }

    for seed in file.clients {
        let name = seed.name.trim().to_owned();
        if name.is_empty() {
            return Err(SeedError::Invalid("seed client without a name".into()));
        }
        let sales_rep_id = match seed.sales_rep.as_deref() {
            Some(username) => Some(
                store
                    .find_user_by_username(username)
                    .map(|r| r.user.id)
                    .ok_or_else(|| SeedError::Invalid(format!("client {name}: unknown sales rep {username}")))?,
            ),
            None => None,
        };
        let client = Client {
            id: Uuid::new_v4(),
            name,
            company: seed.company,
            email: seed.email,
            phone: seed.phone,
            address: seed.address,
            notes: seed.notes,
            sales_rep_id,
            created_by: sales_rep_id,
            created_at: now,
        };
        store.clients.insert(client.id, client);
    }

    for seed in file.products {
        let bundle_id = seed.product.bundle_id.trim().to_owned();
        let wrap = |source| SeedError::Product { bundle_id: bundle_id.clone(), source };
        let product = inventory::build_product(seed.product, now).map_err(wrap)?;
        if store.products.values().any(|p| p.bundle_id.eq_ignore_ascii_case(&product.bundle_id)) {
            return Err(SeedError::Invalid(format!("duplicate seed bundle id: {bundle_id}")));
        }
        for input in seed.slabs {
            let slab = inventory::build_slab(&product, input, now).map_err(wrap)?;
            if store.slabs.values().any(|s| s.product_id == product.id && s.slab_number == slab.slab_number) {
                return Err(SeedError::Invalid(format!("duplicate slab {} in {bundle_id}", slab.slab_number)));
            }
            store.slabs.insert(slab.id, slab);
        }
        store.products.insert(product.id, product);
    }

    Ok(store)
}

#[cfg(test)]
#[path = "seed_test.rs"]
mod tests;
