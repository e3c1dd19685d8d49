//! Durable storage for the API credential.
//!
//! The conversation session only needs `get`; the settings surfaces also
//! `set` and `delete`. [`KeyringSecretStore`] keeps values in the platform
//! keyring and memoizes lookups so repeated sends do not hit the backend.
//! [`MemorySecretStore`] is process-local and backs tests and `--no-keyring`.

use crate::core::constants::APP_NAME;
use keyring::Entry;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum SecretStoreError {
    /// The keyring backend is locked or unreachable right now.
    Unavailable(Arc<keyring::Error>),
    /// The keyring refused the entry itself.
    Rejected(Arc<keyring::Error>),
    /// Any other storage failure.
    Storage(String),
}

impl SecretStoreError {
    /// True when retrying later might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SecretStoreError::Unavailable(_))
    }
}

impl fmt::Display for SecretStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretStoreError::Unavailable(err) => write!(f, "keyring unavailable: {err}"),
            SecretStoreError::Rejected(err) => write!(f, "keyring error: {err}"),
            SecretStoreError::Storage(message) => write!(f, "secret storage failed: {message}"),
        }
    }
}

impl Error for SecretStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SecretStoreError::Unavailable(err) | SecretStoreError::Rejected(err) => {
                Some(err.as_ref())
            }
            SecretStoreError::Storage(_) => None,
        }
    }
}

impl From<keyring::Error> for SecretStoreError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                SecretStoreError::Unavailable(Arc::new(err))
            }
            other => SecretStoreError::Rejected(Arc::new(other)),
        }
    }
}

/// A named-secret store. Absence is a normal outcome, never an error.
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError>;

    fn set(&self, name: &str, value: &str) -> Result<(), SecretStoreError>;

    /// Removing a missing entry succeeds.
    fn delete(&self, name: &str) -> Result<(), SecretStoreError>;
}

#[derive(Clone, Debug)]
enum KeyringCacheEntry {
    Present(String),
    Missing,
}

pub struct KeyringSecretStore {
    service: String,
    cache: Mutex<HashMap<String, KeyringCacheEntry>>,
}

impl KeyringSecretStore {
    pub fn new() -> Self {
        Self::with_service(APP_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, name: &str) -> Result<Entry, SecretStoreError> {
        Entry::new(&self.service, name).map_err(SecretStoreError::from)
    }

    fn cached(&self, name: &str) -> Option<KeyringCacheEntry> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn cache_lookup(&self, name: &str, entry: KeyringCacheEntry) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), entry);
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeyringSecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        if let Some(cached) = self.cached(name) {
            return Ok(match cached {
                KeyringCacheEntry::Present(value) => Some(value),
                KeyringCacheEntry::Missing => None,
            });
        }

        debug!(service = %self.service, name, "keyring lookup");
        match self.entry(name)?.get_password() {
            Ok(value) => {
                self.cache_lookup(name, KeyringCacheEntry::Present(value.clone()));
                Ok(Some(value))
            }
            Err(keyring::Error::NoEntry) => {
                self.cache_lookup(name, KeyringCacheEntry::Missing);
                Ok(None)
            }
            Err(err) => {
                let err = SecretStoreError::from(err);
                debug!(name, recoverable = err.is_recoverable(), error = %err, "keyring lookup failed");
                Err(err)
            }
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        self.entry(name)?.set_password(value)?;
        self.cache_lookup(name, KeyringCacheEntry::Present(value.to_string()));
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), SecretStoreError> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                self.cache_lookup(name, KeyringCacheEntry::Missing);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory store; values live as long as the process.
#[derive(Default)]
pub struct MemorySecretStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a single secret.
    pub fn with_secret(name: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
        store
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), SecretStoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        Ok(())
    }
}

/// Mask a credential for display, keeping only its last four characters.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
