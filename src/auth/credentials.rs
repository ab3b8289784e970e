//! Remember-me credential storage via the OS keychain.
//!
//! Stores the login password keyed by username so hosts can offer a
//! stored-password login. Tokens never go through here; they live in the
//! session record.

use keyring::Entry;
use thiserror::Error;

/// Keychain service identifier
const SERVICE_NAME: &str = "callsheet";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),
}

pub struct CredentialStore;

impl CredentialStore {
    /// Save the password for a username, replacing any previous entry.
    pub fn remember(username: &str, password: &str) -> Result<(), CredentialError> {
        Entry::new(SERVICE_NAME, username)?.set_password(password)?;
        Ok(())
    }

    /// Look up the saved password; `None` when nothing is stored.
    pub fn recall(username: &str) -> Result<Option<String>, CredentialError> {
        match Entry::new(SERVICE_NAME, username)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the saved password. Forgetting an unknown username is fine.
    pub fn forget(username: &str) -> Result<(), CredentialError> {
        match Entry::new(SERVICE_NAME, username)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn has_saved(username: &str) -> bool {
        matches!(Self::recall(username), Ok(Some(_)))
    }
}
