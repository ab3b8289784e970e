//! Client session and API core for the Callsheet artist availability
//! service.
//!
//! This crate owns the token lifecycle for a Callsheet client: it stamps
//! every outgoing request with the current access token, recovers from
//! token expiry with a single-flight refresh, and degrades to a
//! logged-out state when recovery is impossible. Host applications (TUI,
//! GUI, web view) issue requests through [`ApiClient`] and subscribe to
//! [`AuthEvent`] to learn when the session has been terminated.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod logging;
pub mod models;

use anyhow::Result;
use tokio::sync::broadcast;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthEvent, CredentialStore, RefreshError, Session, SessionGate, SessionStore};
pub use config::Config;
pub use models::{Artist, AvailabilitySlot, RegisterOutcome, User};

/// Assemble the session core from a loaded [`Config`].
///
/// Rehydrates the session store from its durable record, wires the store
/// into the session gate and API client, and hands back the event
/// receiver the host should watch for forced-logout navigation.
pub fn bootstrap(config: &Config) -> Result<(ApiClient, broadcast::Receiver<AuthEvent>)> {
    let store = SessionStore::new(config.cache_dir()?);
    store.rehydrate()?;

    let (gate, events) = SessionGate::new(store.clone());
    let client = ApiClient::new(config, store, gate)?;

    Ok((client, events))
}
