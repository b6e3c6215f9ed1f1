//! Durable storage for the optional backend API key.
//!
//! The key lives in the platform keyring under a fixed service/key pair and
//! outlives any chat session. [`SettingsStore`] layers the save semantics on
//! top of a raw [`CredentialBackend`]: values are trimmed and an empty value
//! clears the entry instead of storing an empty string.

use std::error::Error;
use std::fmt;
use std::sync::Mutex;

use keyring::Entry;
use tracing::{debug, warn};

pub const CREDENTIAL_SERVICE: &str = "medassist";
pub const CREDENTIAL_KEY: &str = "hemav_api_key";

/// Describes failures when accessing credential storage.
///
/// Recoverable errors mean the backend was temporarily unavailable (a locked
/// keychain, no secret service on the session bus). Permanent errors surface
/// the underlying cause directly.
#[derive(Debug)]
pub enum CredentialError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl CredentialError {
    fn inner(&self) -> &keyring::Error {
        match self {
            CredentialError::Recoverable(err) | CredentialError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, CredentialError::Recoverable(_))
    }
}

impl From<keyring::Error> for CredentialError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                CredentialError::Recoverable(err)
            }
            other => CredentialError::Permanent(other),
        }
    }
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "credential storage unavailable: {}", self.inner())
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Raw get/set/delete of a single secret.
pub trait CredentialBackend: Send + Sync {
    fn get(&self) -> Result<Option<String>, CredentialError>;
    fn set(&self, value: &str) -> Result<(), CredentialError>;
    fn delete(&self) -> Result<(), CredentialError>;
}

pub struct KeyringBackend {
    service: String,
    key: String,
}

impl KeyringBackend {
    pub fn new() -> Self {
        Self {
            service: CREDENTIAL_SERVICE.to_string(),
            key: CREDENTIAL_KEY.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry, CredentialError> {
        Ok(Entry::new(&self.service, &self.key)?)
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialBackend for KeyringBackend {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        match self.entry()?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, value: &str) -> Result<(), CredentialError> {
        self.entry()?.set_password(value)?;
        Ok(())
    }

    fn delete(&self) -> Result<(), CredentialError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local storage used with `--no-keyring`; forgotten on exit.
#[derive(Default)]
pub struct MemoryBackend {
    value: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned slot still holds a valid Option.
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialBackend for MemoryBackend {
    fn get(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.slot().clone())
    }

    fn set(&self, value: &str) -> Result<(), CredentialError> {
        *self.slot() = Some(value.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<(), CredentialError> {
        *self.slot() = None;
        Ok(())
    }
}

pub struct SettingsStore {
    backend: Box<dyn CredentialBackend>,
}

impl SettingsStore {
    pub fn new(backend: Box<dyn CredentialBackend>) -> Self {
        Self { backend }
    }

    pub fn keyring() -> Self {
        Self::new(Box::new(KeyringBackend::new()))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// The stored key, if any. Blank stored values read as absent.
    pub fn load_credential(&self) -> Result<Option<String>, CredentialError> {
        Ok(self
            .backend
            .get()?
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }

    /// Store `value` trimmed, or clear the entry when it is blank.
    pub fn save_credential(&self, value: &str) -> Result<(), CredentialError> {
        let value = value.trim();
        if value.is_empty() {
            debug!("blank credential submitted; clearing stored key");
            return self.clear_credential();
        }
        self.backend.set(value)
    }

    pub fn clear_credential(&self) -> Result<(), CredentialError> {
        self.backend.delete()
    }

    /// Like [`load_credential`](Self::load_credential), but a storage failure
    /// reads as "no key" so a query can still go out.
    pub fn credential_or_none(&self) -> Option<String> {
        match self.load_credential() {
            Ok(value) => value,
            Err(err) => {
                warn!(recoverable = err.is_recoverable(), "{err}");
                None
            }
        }
    }
}

/// Mask all but the last four characters of a key for display.
pub fn mask_credential(value: &str) -> String {
    let len = value.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let tail: String = value.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), tail)
}
