//! Credential storage.
//!
//! The session reads and writes provider secrets through [`CredentialStore`].
//! [`KeyringCredentialStore`] is the durable implementation: secrets go to the
//! OS keyring and the active-provider preference to the config file.
//! [`MemoryCredentialStore`] keeps everything in process and backs
//! `--env-only` runs as well as tests.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::keyring::{self, KeyringAccessError};
use crate::core::providers::Provider;

pub mod ui;

pub const MISSING_KEY_MESSAGE: &str = "Enter an API key";
pub const KEY_PREFIX: &str = "sk-";

pub trait CredentialStore: Send + Sync {
    fn get(&self, provider: Provider) -> Result<Option<String>, CredentialError>;

    /// Persist immediately; the key is usable once this returns.
    fn set(&self, provider: Provider, secret: &str) -> Result<(), CredentialError>;

    fn remove(&self, provider: Provider) -> Result<(), CredentialError>;

    fn active_provider_preference(&self) -> Provider;

    fn set_active_provider_preference(&self, provider: Provider) -> Result<(), CredentialError>;
}

#[derive(Debug)]
pub enum CredentialError {
    Keyring(KeyringAccessError),
    Config(Box<dyn Error>),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::Keyring(err) => write!(f, "{err}"),
            CredentialError::Config(err) => write!(f, "could not save settings: {err}"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CredentialError::Keyring(err) => Some(err),
            CredentialError::Config(err) => Some(err.as_ref()),
        }
    }
}

impl From<KeyringAccessError> for CredentialError {
    fn from(err: KeyringAccessError) -> Self {
        CredentialError::Keyring(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValidationError {
    Empty,
    MissingPrefix,
}

impl fmt::Display for KeyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValidationError::Empty => f.write_str(MISSING_KEY_MESSAGE),
            KeyValidationError::MissingPrefix => {
                write!(f, "The key must start with \"{KEY_PREFIX}\"")
            }
        }
    }
}

impl Error for KeyValidationError {}

/// Front-end check run before a key reaches the store. Returns the trimmed key.
pub fn validate_api_key(input: &str) -> Result<String, KeyValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(KeyValidationError::Empty);
    }
    if !trimmed.starts_with(KEY_PREFIX) {
        return Err(KeyValidationError::MissingPrefix);
    }
    Ok(trimmed.to_string())
}

fn env_secret(provider: Provider) -> Option<String> {
    std::env::var(&provider.spec().api_key_env)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Clone, Debug)]
enum CachedSecret {
    Present(String),
    Missing,
}

pub struct KeyringCredentialStore {
    config: Mutex<Config>,
    config_path: PathBuf,
    cache: Mutex<HashMap<Provider, CachedSecret>>,
}

impl KeyringCredentialStore {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config: Mutex::new(config),
            config_path,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load the config from its default location.
    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Config::get_config_path()?;
        let config = Config::load_from_path(&config_path)?;
        Ok(Self::new(config, config_path))
    }

    fn cached(&self, provider: Provider) -> Option<CachedSecret> {
        let cache = self.cache.lock().ok()?;
        cache.get(&provider).cloned()
    }

    fn remember(&self, provider: Provider, entry: CachedSecret) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(provider, entry);
        }
    }

    fn keyring_secret(&self, provider: Provider) -> Result<Option<String>, KeyringAccessError> {
        if let Some(cached) = self.cached(provider) {
            return Ok(match cached {
                CachedSecret::Present(secret) => Some(secret),
                CachedSecret::Missing => None,
            });
        }

        debug!(provider = %provider, "Keyring lookup");
        let secret = keyring::read_secret(provider.id())?;
        self.remember(
            provider,
            secret
                .clone()
                .map(CachedSecret::Present)
                .unwrap_or(CachedSecret::Missing),
        );
        Ok(secret)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, provider: Provider) -> Result<Option<String>, CredentialError> {
        match self.keyring_secret(provider) {
            Ok(Some(secret)) => Ok(Some(secret)),
            Ok(None) => Ok(env_secret(provider)),
            Err(err) => match env_secret(provider) {
                Some(secret) => {
                    warn!(provider = %provider, error = %err, "Keyring unavailable, using environment key");
                    Ok(Some(secret))
                }
                None => Err(err.into()),
            },
        }
    }

    fn set(&self, provider: Provider, secret: &str) -> Result<(), CredentialError> {
        keyring::write_secret(provider.id(), secret)?;
        self.remember(provider, CachedSecret::Present(secret.to_string()));
        debug!(provider = %provider, "Stored API key");
        Ok(())
    }

    fn remove(&self, provider: Provider) -> Result<(), CredentialError> {
        keyring::delete_secret(provider.id())?;
        self.remember(provider, CachedSecret::Missing);
        Ok(())
    }

    fn active_provider_preference(&self) -> Provider {
        self.config
            .lock()
            .map(|config| config.provider_preference())
            .unwrap_or_default()
    }

    fn set_active_provider_preference(&self, provider: Provider) -> Result<(), CredentialError> {
        let mut config = self
            .config
            .lock()
            .map_err(|_| CredentialError::Config("config lock poisoned".into()))?;
        config.set_provider_preference(provider);
        config
            .save_to_path(&self.config_path)
            .map_err(CredentialError::Config)
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    secrets: Mutex<HashMap<Provider, String>>,
    preference: Mutex<Provider>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from `N1N_API_KEY` / `OPENROUTER_API_KEY`.
    pub fn from_env(preference: Provider) -> Self {
        let store = Self::new().with_preference(preference);
        if let Ok(mut secrets) = store.secrets.lock() {
            for provider in Provider::ALL {
                if let Some(secret) = env_secret(provider) {
                    secrets.insert(provider, secret);
                }
            }
        }
        store
    }

    pub fn with_secret(self, provider: Provider, secret: &str) -> Self {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.insert(provider, secret.to_string());
        }
        self
    }

    pub fn with_preference(self, provider: Provider) -> Self {
        if let Ok(mut preference) = self.preference.lock() {
            *preference = provider;
        }
        self
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, provider: Provider) -> Result<Option<String>, CredentialError> {
        Ok(self
            .secrets
            .lock()
            .ok()
            .and_then(|secrets| secrets.get(&provider).cloned()))
    }

    fn set(&self, provider: Provider, secret: &str) -> Result<(), CredentialError> {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.insert(provider, secret.to_string());
        }
        Ok(())
    }

    fn remove(&self, provider: Provider) -> Result<(), CredentialError> {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.remove(&provider);
        }
        Ok(())
    }

    fn active_provider_preference(&self) -> Provider {
        self.preference
            .lock()
            .map(|preference| *preference)
            .unwrap_or_default()
    }

    fn set_active_provider_preference(&self, provider: Provider) -> Result<(), CredentialError> {
        if let Ok(mut preference) = self.preference.lock() {
            *preference = provider;
        }
        Ok(())
    }
}
