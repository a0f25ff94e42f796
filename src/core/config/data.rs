use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::providers::Provider;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Provider selected on the last run ("n1n" or "openrouter")
    pub default_provider: Option<String>,
    /// `tracing` filter directive used when `RELAYCHAT_LOG` is unset
    pub log_level: Option<String>,
}

impl Config {
    pub fn provider_preference(&self) -> Provider {
        Provider::from_preference(self.default_provider.as_deref())
    }

    pub fn set_provider_preference(&mut self, provider: Provider) {
        self.default_provider = Some(provider.id().to_string());
    }
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_preference_defaults_to_n1n() {
        let config = Config::default();
        assert_eq!(config.provider_preference(), Provider::N1n);
    }

    #[test]
    fn preference_round_trips_through_provider_id() {
        let mut config = Config::default();
        config.set_provider_preference(Provider::OpenRouter);
        assert_eq!(config.default_provider.as_deref(), Some("openrouter"));
        assert_eq!(config.provider_preference(), Provider::OpenRouter);
    }
}
