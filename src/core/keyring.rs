//! Thin wrapper over the platform keyring.
//!
//! Each provider's secret lives in its own entry under the `relaychat`
//! service. Failures are split into recoverable (backend locked or
//! unreachable) and permanent ones so callers can decide whether to fall back
//! to an in-memory key for the rest of the session.

use std::error::Error;
use std::fmt;

use keyring::Entry;

pub const KEYRING_SERVICE: &str = "relaychat";

#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_recoverable() {
            write!(f, "keyring temporarily unavailable: {}", self.inner())
        } else {
            write!(f, "keyring error: {}", self.inner())
        }
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

fn entry(account: &str) -> Result<Entry, KeyringAccessError> {
    Entry::new(KEYRING_SERVICE, account).map_err(KeyringAccessError::from)
}

/// Read a secret; a missing entry is `Ok(None)`.
pub fn read_secret(account: &str) -> Result<Option<String>, KeyringAccessError> {
    match entry(account)?.get_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub fn write_secret(account: &str, secret: &str) -> Result<(), KeyringAccessError> {
    entry(account)?
        .set_password(secret)
        .map_err(KeyringAccessError::from)
}

/// Delete a secret; deleting a missing entry is not an error.
pub fn delete_secret(account: &str) -> Result<(), KeyringAccessError> {
    match entry(account)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
