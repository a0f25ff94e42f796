//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod model_list;

use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::auth::ui::{interactive_auth, interactive_deauth};
use crate::auth::{CredentialStore, KeyringCredentialStore, MemoryCredentialStore};
use crate::cli::chat::run_chat;
use crate::cli::model_list::list_models;
use crate::core::app::StartupOptions;
use crate::core::chat_client::{ChatBackend, HttpChatBackend};
use crate::core::config::Config;
use crate::core::providers::Provider;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "relaychat")]
#[command(about = "A terminal chat client for n1n.ai and OpenRouter")]
#[command(
    long_about = "relaychat talks to two OpenAI-compatible chat-completion providers, \
n1n.ai and OpenRouter. Switching provider or model starts a fresh conversation.\n\n\
Authentication:\n\
  Use 'relaychat auth' to store API keys in your system keyring.\n\n\
Environment Variables (fallback if no key is stored):\n\
  N1N_API_KEY          Key for n1n.ai\n\
  OPENROUTER_API_KEY   Key for OpenRouter\n\
  RELAYCHAT_LOG        tracing filter for diagnostics (e.g. debug)\n\n\
Commands:\n\
  /help             Show all chat commands\n\
  /log <filename>   Enable logging to specified file\n\
  /log              Toggle logging pause/resume"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to chat with (defaults to the provider's default model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,

    /// Provider to use: n1n or openrouter
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Read keys from environment variables only; never touch the keyring
    #[arg(long, global = true)]
    pub env_only: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up authentication for API providers
    Auth,
    /// Remove authentication for API providers
    Deauth,
    /// Start the chat interface (default)
    Chat,
    /// List models for a provider
    Models,
    /// Set configuration values
    Set {
        /// Configuration key to set: default-provider or log-level
        key: String,
        /// Value to set for the key
        value: Option<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config_path = Config::get_config_path()?;
    let config = Config::load_from_path(&config_path)?;
    init_tracing(config.log_level.as_deref());

    tokio::runtime::Runtime::new()?.block_on(async_main(args, config, config_path))
}

fn parse_provider(value: Option<&str>) -> Result<Option<Provider>, Box<dyn Error>> {
    Ok(value.map(str::parse::<Provider>).transpose()?)
}

/// Key management needs a store that outlives the process.
fn require_keyring(env_only: bool, command: &str) -> Result<(), Box<dyn Error>> {
    if env_only {
        return Err(format!(
            "'{command}' manages keys in the system keyring and cannot be combined with --env-only"
        )
        .into());
    }
    Ok(())
}

fn credential_store(
    env_only: bool,
    config: Config,
    config_path: std::path::PathBuf,
) -> Arc<dyn CredentialStore> {
    if env_only {
        Arc::new(MemoryCredentialStore::from_env(config.provider_preference()))
    } else {
        Arc::new(KeyringCredentialStore::new(config, config_path))
    }
}

async fn async_main(
    args: Args,
    config: Config,
    config_path: std::path::PathBuf,
) -> Result<(), Box<dyn Error>> {
    let provider = parse_provider(args.provider.as_deref())?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Auth => {
            require_keyring(args.env_only, "auth")?;
            let store = credential_store(args.env_only, config, config_path);
            if let Err(e) = interactive_auth(store.as_ref(), provider) {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            require_keyring(args.env_only, "deauth")?;
            let store = credential_store(args.env_only, config, config_path);
            if let Err(e) = interactive_deauth(store.as_ref(), provider) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => set_config(config, &config_path, &key, value),
        Commands::Models => {
            let store = credential_store(args.env_only, config, config_path);
            let backend = HttpChatBackend::new(reqwest::Client::new());
            list_models(store.as_ref(), &backend, provider).await
        }
        Commands::Chat => {
            let store = credential_store(args.env_only, config, config_path);
            let backend: Arc<dyn ChatBackend> =
                Arc::new(HttpChatBackend::new(reqwest::Client::new()));
            let options = StartupOptions {
                provider,
                model: args.model,
            };
            run_chat(store, options, args.log, backend).await
        }
    }
}

fn set_config(
    mut config: Config,
    config_path: &std::path::Path,
    key: &str,
    value: Option<String>,
) -> Result<(), Box<dyn Error>> {
    match key {
        "default-provider" => match value {
            Some(value) => {
                let provider: Provider = value.parse()?;
                config.set_provider_preference(provider);
                config.save_to_path(config_path)?;
                println!("✅ Set default-provider to: {provider}");
            }
            None => println!(
                "default-provider: {}",
                config.provider_preference().id()
            ),
        },
        "log-level" => match value {
            Some(value) => {
                config.log_level = Some(value.clone());
                config.save_to_path(config_path)?;
                println!("✅ Set log-level to: {value}");
            }
            None => println!(
                "log-level: {}",
                config.log_level.as_deref().unwrap_or("warn")
            ),
        },
        _ => {
            eprintln!("❌ Unknown config key: {key}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let args = Args::try_parse_from([
            "relaychat", "chat", "-p", "openrouter", "-m", "x-ai/grok-2", "--env-only",
        ])
        .expect("args");
        assert!(matches!(args.command, Some(Commands::Chat)));
        assert_eq!(args.provider.as_deref(), Some("openrouter"));
        assert_eq!(args.model.as_deref(), Some("x-ai/grok-2"));
        assert!(args.env_only);
    }

    #[test]
    fn unknown_provider_is_an_error() {
        assert!(parse_provider(Some("acme")).is_err());
        assert_eq!(
            parse_provider(Some("OpenRouter")).expect("parse"),
            Some(Provider::OpenRouter)
        );
        assert_eq!(parse_provider(None).expect("parse"), None);
    }

    #[test]
    fn key_management_refuses_env_only() {
        let err = require_keyring(true, "auth").expect_err("env-only auth");
        assert!(err.to_string().contains("--env-only"));
        assert!(require_keyring(true, "deauth").is_err());
        assert!(require_keyring(false, "auth").is_ok());
    }

    #[test]
    fn set_default_provider_persists() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        set_config(
            Config::default(),
            &path,
            "default-provider",
            Some("openrouter".into()),
        )
        .expect("set");

        let saved = Config::load_from_path(&path).expect("load");
        assert_eq!(saved.provider_preference(), Provider::OpenRouter);
    }

    #[test]
    fn set_log_level_persists() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        set_config(Config::default(), &path, "log-level", Some("debug".into())).expect("set");

        let saved = Config::load_from_path(&path).expect("load");
        assert_eq!(saved.log_level.as_deref(), Some("debug"));
    }
}
