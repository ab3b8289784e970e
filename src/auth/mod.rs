//! Authentication module: session state, token refresh, and session
//! termination.
//!
//! This module provides:
//! - `SessionStore`: process-wide session state with durable persistence
//! - `RefreshCoordinator`: single-flight token refresh with a FIFO
//!   waiter queue
//! - `SessionGate`: the forced-logout signal for the hosting application
//! - `CredentialStore`: optional remember-me via the OS keychain

pub mod credentials;
pub mod gate;
pub mod refresh;
pub mod session;

pub use credentials::{CredentialError, CredentialStore};
pub use gate::{AuthEvent, SessionGate};
pub use refresh::{RefreshCoordinator, RefreshError, TokenRefresher};
pub use session::{Session, SessionStore};
