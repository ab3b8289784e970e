//! Session state and its durable record.
//!
//! The session is the pair of credentials plus the account identity. It
//! lives in process memory and is mirrored to a JSON record in the cache
//! directory so a restart rehydrates the same state. The in-memory value
//! is authoritative while the process is live; the record exists only
//! for persistence across restarts.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::User;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// The authenticated identity and credential pair.
///
/// `is_authenticated` is derived from the token pair and maintained
/// exclusively by [`SessionStore`] mutations; it is recomputed on
/// rehydration so an edited record cannot carry an inconsistent flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            user: None,
            is_authenticated: false,
            created_at: Utc::now(),
        }
    }
}

impl Session {
    fn derive_authenticated(&mut self) {
        self.is_authenticated = self.access_token.is_some() && self.refresh_token.is_some();
    }
}

struct StoreInner {
    session: RwLock<Session>,
    cache_dir: PathBuf,
}

/// Process-wide session state.
///
/// Clone is cheap - the handle shares one inner state via Arc. All
/// operations are synchronous; mutation and persistence happen under the
/// write lock, so readers never observe a partial update.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Create a store holding the empty, unauthenticated session.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                session: RwLock::new(Session::default()),
                cache_dir,
            }),
        }
    }

    /// Load the durable record, if any. Returns whether an authenticated
    /// session was restored.
    pub fn rehydrate(&self) -> Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents =
            std::fs::read_to_string(&path).context("Failed to read session file")?;
        let mut session: Session =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        session.derive_authenticated();

        let restored = session.is_authenticated;
        debug!(restored, "Session rehydrated from disk");
        *self.write_lock() = session;
        Ok(restored)
    }

    /// Snapshot of the current session. No side effects.
    pub fn get(&self) -> Session {
        self.read_lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_lock().is_authenticated
    }

    /// Replace the full session after a successful login or
    /// registration, and persist it.
    pub fn set_auth(&self, user: Option<User>, access_token: &str, refresh_token: &str) -> Result<()> {
        let mut session = self.write_lock();
        *session = Session {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            user,
            is_authenticated: false,
            created_at: Utc::now(),
        };
        session.derive_authenticated();
        self.persist(&session)
    }

    /// Replace only the access token, leaving the refresh token and user
    /// untouched, and persist. Used by the refresh coordinator after a
    /// successful refresh.
    ///
    /// The in-memory value is committed even when the durable write
    /// fails; callers decide whether to surface the error.
    pub fn update_access_token(&self, access_token: &str) -> Result<()> {
        let mut session = self.write_lock();
        session.access_token = Some(access_token.to_string());
        session.derive_authenticated();
        self.persist(&session)
    }

    /// Reset to the unauthenticated empty session and remove the durable
    /// record.
    pub fn clear(&self) -> Result<()> {
        let mut session = self.write_lock();
        *session = Session::default();
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    /// Flush the current state to the durable record. Host shutdown hook.
    pub fn teardown(&self) -> Result<()> {
        let session = self.read_lock();
        if session.is_authenticated {
            self.persist(&session)
        } else {
            drop(session);
            self.clear()
        }
    }

    fn persist(&self, session: &Session) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.inner.cache_dir.join(SESSION_FILE)
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        // Recover the inner value if a writer panicked; the session is
        // plain data and stays structurally valid.
        self.inner.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.inner.session.write().unwrap_or_else(|e| e.into_inner())
    }
}
