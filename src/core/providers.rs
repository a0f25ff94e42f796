//! Built-in provider registry
//!
//! The two supported backends are described in the embedded
//! `builtin_providers.toml` and parsed once per process. [`Provider`] is the
//! closed set of backends the session can switch between; [`ProviderSpec`]
//! carries everything needed to talk to one of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    N1n,
    OpenRouter,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::N1n, Provider::OpenRouter];

    pub fn id(self) -> &'static str {
        match self {
            Provider::N1n => "n1n",
            Provider::OpenRouter => "openrouter",
        }
    }

    pub fn spec(self) -> &'static ProviderSpec {
        builtin_providers()
            .iter()
            .find(|spec| spec.id == self.id())
            .expect("builtin_providers.toml is missing a built-in provider")
    }

    pub fn display_name(self) -> &'static str {
        &self.spec().display_name
    }

    pub fn default_model(self) -> &'static str {
        &self.spec().default_model
    }

    /// The other provider; used by the front end's quick toggle.
    pub fn other(self) -> Provider {
        match self {
            Provider::N1n => Provider::OpenRouter,
            Provider::OpenRouter => Provider::N1n,
        }
    }

    /// Parse a persisted preference, falling back to n1n for anything unknown.
    pub fn from_preference(value: Option<&str>) -> Provider {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider(pub String);

impl fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown provider '{}'. Available providers: {}",
            self.0,
            Provider::ALL.map(Provider::id).join(", ")
        )
    }
}

impl std::error::Error for UnknownProvider {}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Provider::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownProvider(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
    pub default_model: String,
    /// Environment variable consulted when no stored key exists
    pub api_key_env: String,
    #[serde(default)]
    pub popular_models: Vec<String>,
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

impl ProviderSpec {
    pub fn is_popular(&self, model_id: &str) -> bool {
        self.popular_models.iter().any(|id| id == model_id)
    }
}

#[derive(Debug, Deserialize)]
struct BuiltinProvidersConfig {
    providers: Vec<ProviderSpec>,
}

/// Load built-in providers from the embedded configuration
pub fn builtin_providers() -> &'static [ProviderSpec] {
    static PROVIDERS: OnceLock<Vec<ProviderSpec>> = OnceLock::new();
    PROVIDERS.get_or_init(|| {
        const CONFIG_CONTENT: &str = include_str!("../builtin_providers.toml");

        let config: BuiltinProvidersConfig =
            toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_providers.toml");
        config.providers
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_a_spec() {
        for provider in Provider::ALL {
            let spec = provider.spec();
            assert_eq!(spec.id, provider.id());
            assert!(spec.base_url.starts_with("https://"));
            assert!(!spec.display_name.is_empty());
            assert!(!spec.popular_models.is_empty());
        }
    }

    #[test]
    fn each_provider_has_its_own_default_model() {
        assert_eq!(Provider::N1n.default_model(), "deepseek-v3.2");
        assert_eq!(Provider::OpenRouter.default_model(), "openai/gpt-4o");
    }

    #[test]
    fn only_openrouter_sends_attribution_headers() {
        assert!(Provider::N1n.spec().extra_headers.is_empty());
        let headers = &Provider::OpenRouter.spec().extra_headers;
        assert!(headers.contains_key("HTTP-Referer"));
        assert_eq!(headers.get("X-Title").map(String::as_str), Some("n1n.ai Chat"));
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("OpenRouter".parse::<Provider>(), Ok(Provider::OpenRouter));
        assert_eq!(" n1n ".parse::<Provider>(), Ok(Provider::N1n));
        assert!("anthropic".parse::<Provider>().is_err());
    }

    #[test]
    fn unknown_preference_falls_back_to_n1n() {
        assert_eq!(Provider::from_preference(None), Provider::N1n);
        assert_eq!(Provider::from_preference(Some("bogus")), Provider::N1n);
        assert_eq!(
            Provider::from_preference(Some("openrouter")),
            Provider::OpenRouter
        );
    }

    #[test]
    fn popular_lookup_uses_exact_ids() {
        let spec = Provider::N1n.spec();
        assert!(spec.is_popular("kimi-k2.5"));
        assert!(!spec.is_popular("kimi"));
    }
}
