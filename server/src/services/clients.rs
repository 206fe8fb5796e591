//! Client accounts.
//!
//! Sales reps only see and edit clients assigned to them or created by
//! them; new clients they create are assigned to them automatically.

use domain::model::{Client, EntityKind, Quote};
use domain::permissions::{Action, Module, Scope};
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::activity;
use super::session::{PermissionDenied, SessionUser};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client not found: {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Denied(#[from] PermissionDenied),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub sales_rep_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub sales_rep_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientFilter {
    pub search: Option<String>,
    pub sales_rep_id: Option<Uuid>,
}

fn owns(actor: &SessionUser, client: &Client) -> bool {
    actor.scope() == Scope::All || client.sales_rep_id == Some(actor.id) || client.created_by == Some(actor.id)
}

fn matches(filter: &ClientFilter, client: &Client) -> bool {
    if filter.sales_rep_id.is_some_and(|rep| client.sales_rep_id != Some(rep)) {
        return false;
    }
    let Some(needle) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    let needle = needle.to_lowercase();
    [Some(&client.name), client.company.as_ref(), client.email.as_ref(), client.phone.as_ref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// # Errors
///
/// Returns [`ClientError::Denied`] without `clients:view`.
pub async fn list_clients(
    state: &AppState,
    actor: &SessionUser,
    filter: &ClientFilter,
) -> Result<Vec<Client>, ClientError> {
    actor.require(Module::Clients, Action::View)?;
    let store = state.store.read().await;
    let mut clients: Vec<Client> = store
        .clients
        .values()
        .filter(|c| owns(actor, c) && matches(filter, c))
        .cloned()
        .collect();
    clients.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(clients)
}

/// # Errors
///
/// Returns [`ClientError::NotFound`] (also for clients outside the caller's
/// book) or [`ClientError::Denied`].
pub async fn get_client(state: &AppState, actor: &SessionUser, client_id: Uuid) -> Result<Client, ClientError> {
    actor.require(Module::Clients, Action::View)?;
    let store = state.store.read().await;
    store
        .clients
        .get(&client_id)
        .filter(|c| owns(actor, c))
        .cloned()
        .ok_or(ClientError::NotFound(client_id))
}

/// # Errors
///
/// Returns [`ClientError::Invalid`] or [`ClientError::Denied`].
pub async fn create_client(state: &AppState, actor: &SessionUser, input: NewClient) -> Result<Client, ClientError> {
    actor.require(Module::Clients, Action::Create)?;
    let name = input.name.trim().to_owned();
    if name.is_empty() {
        return Err(ClientError::Invalid("client name is required".into()));
    }
    let sales_rep_id = match actor.scope() {
        Scope::Own => Some(actor.id),
        Scope::All => input.sales_rep_id,
    };

    let mut store = state.store.write().await;
    if let Some(rep) = sales_rep_id {
        if !store.users.contains_key(&rep) {
            return Err(ClientError::Invalid(format!("unknown sales rep: {rep}")));
        }
    }
    let client = Client {
        id: Uuid::new_v4(),
        name,
        company: input.company,
        email: input.email,
        phone: input.phone,
        address: input.address,
        notes: input.notes,
        sales_rep_id,
        created_by: Some(actor.id),
        created_at: OffsetDateTime::now_utc(),
    };
    store.clients.insert(client.id, client.clone());
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Client,
        Some(client.id),
        "created",
        format!("Added client {}", client.name),
    );
    Ok(client)
}

/// # Errors
///
/// Returns [`ClientError::NotFound`], [`ClientError::Invalid`] or
/// [`ClientError::Denied`].
pub async fn update_client(
    state: &AppState,
    actor: &SessionUser,
    client_id: Uuid,
    update: ClientUpdate,
) -> Result<Client, ClientError> {
    actor.require(Module::Clients, Action::Edit)?;
    if update.sales_rep_id.is_some() && actor.scope() == Scope::Own {
        return Err(ClientError::Invalid("sales reps cannot reassign clients".into()));
    }

    let mut store = state.store.write().await;
    if let Some(rep) = update.sales_rep_id {
        if !store.users.contains_key(&rep) {
            return Err(ClientError::Invalid(format!("unknown sales rep: {rep}")));
        }
    }
    let client = store
        .clients
        .get_mut(&client_id)
        .filter(|c| owns(actor, c))
        .ok_or(ClientError::NotFound(client_id))?;
    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Invalid("client name is required".into()));
        }
        name.clone_into(&mut client.name);
    }
    for (slot, value) in [
        (&mut client.company, update.company),
        (&mut client.email, update.email),
        (&mut client.phone, update.phone),
        (&mut client.address, update.address),
        (&mut client.notes, update.notes),
    ] {
        if value.is_some() {
            *slot = value;
        }
    }
    if update.sales_rep_id.is_some() {
        client.sales_rep_id = update.sales_rep_id;
    }
    let client = client.clone();
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Client,
        Some(client_id),
        "updated",
        format!("Updated client {}", client.name),
    );
    Ok(client)
}

/// # Errors
///
/// Returns [`ClientError::NotFound`], [`ClientError::Conflict`] while quotes
/// still reference the client, or [`ClientError::Denied`].
pub async fn delete_client(state: &AppState, actor: &SessionUser, client_id: Uuid) -> Result<(), ClientError> {
    actor.require(Module::Clients, Action::Delete)?;
    let mut store = state.store.write().await;
    if !store.clients.contains_key(&client_id) {
        return Err(ClientError::NotFound(client_id));
    }
    let quotes = store.quotes.values().filter(|q| q.client_id == client_id).count();
    if quotes > 0 {
        return Err(ClientError::Conflict(format!("client still has {quotes} quote(s)")));
    }
    let client = store.clients.remove(&client_id).ok_or(ClientError::NotFound(client_id))?;
    activity::record(
        &mut store,
        Some(actor.id),
        EntityKind::Client,
        Some(client_id),
        "deleted",
        format!("Removed client {}", client.name),
    );
    Ok(())
}

/// Quotes for one client that the caller may see, newest first.
///
/// # Errors
///
/// Returns [`ClientError::NotFound`] or [`ClientError::Denied`].
pub async fn client_quotes(state: &AppState, actor: &SessionUser, client_id: Uuid) -> Result<Vec<Quote>, ClientError> {
    actor.require(Module::Quotes, Action::View)?;
    get_client(state, actor, client_id).await?;
    let store = state.store.read().await;
    let own_only = actor.scope() == Scope::Own;
    let mut quotes: Vec<Quote> = store
        .quotes
        .values()
        .filter(|q| q.client_id == client_id && (!own_only || q.is_owned_by(actor.id)))
        .cloned()
        .collect();
    quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(quotes)
}

#[cfg(test)]
#[path = "clients_test.rs"]
mod tests;
