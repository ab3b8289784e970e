//! Single-flight token refresh.
//!
//! When a request fails with an authorization error, the coordinator
//! drives at most one refresh call no matter how many requests fail
//! concurrently. Requests that fail while a refresh is outstanding join
//! a FIFO waiter queue and are woken, in enqueue order, once the new
//! access token is committed to the session store. If the refresh fails
//! (or no refresh token exists), every waiter is rejected and the
//! session gate terminates the session.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::gate::SessionGate;
use super::session::SessionStore;
use crate::api::ApiError;

/// Upper bound on how long a waiter may sit in the queue. Matches the
/// request send timeout, so a refresh that completes at all resolves
/// every waiter before this fires.
const REFRESH_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal outcome of a failed recovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh token was absent or rejected; the session is over.
    #[error("session expired - re-authentication required")]
    SessionExpired,
}

/// The seam to the token-refresh endpoint.
///
/// The production implementation posts the refresh token to the service;
/// tests substitute fakes to exercise the coordination logic.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange the refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String, ApiError>;
}

type WaiterTx = oneshot::Sender<Result<String, RefreshError>>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<WaiterTx> },
}

struct CoordinatorInner {
    state: Mutex<RefreshState>,
    store: SessionStore,
    gate: SessionGate,
    refresher: Arc<dyn TokenRefresher>,
}

/// Process-wide refresh state machine. Clone is cheap - handles share
/// one inner state via Arc.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: SessionStore,
        gate: SessionGate,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                state: Mutex::new(RefreshState::Idle),
                store,
                gate,
                refresher,
            }),
        }
    }

    /// Obtain a fresh access token, joining any refresh already in
    /// flight.
    ///
    /// The first caller to find the machine `Idle` flips it to
    /// `Refreshing` and spawns the driver; everyone else (and the
    /// triggering caller itself) waits as a FIFO queue entry. On success
    /// the new token is returned with the store already updated; on
    /// failure the session has been terminated and the caller should
    /// surface its original authorization error.
    pub async fn recover(&self) -> Result<String, RefreshError> {
        let rx = {
            let mut state = self.inner.state.lock().await;
            let (tx, rx) = oneshot::channel();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    waiters.push(tx);
                    debug!(queued = waiters.len(), "Joined in-flight token refresh");
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing { waiters: vec![tx] };
                    // The refresh runs in its own task so a caller
                    // dropped mid-await cannot leave the machine stuck
                    // in Refreshing.
                    tokio::spawn(drive_refresh(Arc::clone(&self.inner)));
                }
            }
            rx
        };

        match timeout(REFRESH_WAIT_TIMEOUT, rx).await {
            Ok(Ok(outcome)) => outcome,
            // Queue wait expired or the driver vanished; either way the
            // caller treats it as a failed recovery.
            Ok(Err(_)) | Err(_) => Err(RefreshError::SessionExpired),
        }
    }
}

/// Perform the single refresh call and settle every waiter.
async fn drive_refresh(inner: Arc<CoordinatorInner>) {
    let refresh_token = inner.store.get().refresh_token;

    let outcome = match refresh_token {
        None => {
            debug!("No refresh token available; cannot recover");
            Err(RefreshError::SessionExpired)
        }
        Some(token) => match inner.refresher.refresh(&token).await {
            Ok(access_token) => {
                // Commit before any waiter wakes so replays read the new
                // token from the store.
                if let Err(e) = inner.store.update_access_token(&access_token) {
                    warn!(error = %e, "Failed to persist refreshed access token");
                }
                debug!("Token refresh succeeded");
                Ok(access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh rejected");
                Err(RefreshError::SessionExpired)
            }
        },
    };

    // Terminate before rejecting waiters: by the time a caller observes
    // the failure, the session is already cleared.
    if outcome.is_err() {
        inner.gate.terminate();
    }

    let waiters = {
        let mut state = inner.state.lock().await;
        match mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    };

    // FIFO wake order: the request that triggered the refresh replays
    // first, then the rest in the order their failures were observed.
    for tx in waiters {
        // A waiter that timed out has dropped its receiver; skip it.
        let _ = tx.send(outcome.clone());
    }
}
