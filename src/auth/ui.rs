use std::fmt;
use std::io::{self, BufRead, Write};

use super::{validate_api_key, CredentialStore};
use crate::core::providers::Provider;

const KEY_PROMPT: &str = "Enter your API key: ";
const INVALID_CHOICE_MSG: &str = "Invalid choice";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMenuItem {
    pub provider: Provider,
    pub configured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSelection {
    Provider(Provider),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationChoice {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

fn read_answer(prompt: &str) -> Result<String, UiError> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|err| UiError::new(err.to_string()))?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|err| UiError::new(err.to_string()))?;
    Ok(input)
}

pub fn menu_items(store: &dyn CredentialStore) -> Vec<ProviderMenuItem> {
    Provider::ALL
        .into_iter()
        .map(|provider| ProviderMenuItem {
            provider,
            configured: matches!(store.get(provider), Ok(Some(_))),
        })
        .collect()
}

/// Numbered menu with a trailing "Cancel" entry.
pub fn parse_menu_choice(input: &str, items: &[ProviderMenuItem]) -> Result<MenuSelection, UiError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UiError::new("Selection cannot be empty"));
    }
    let choice: usize = trimmed
        .parse()
        .map_err(|_| UiError::new(INVALID_CHOICE_MSG))?;

    match choice {
        0 => Err(UiError::new(INVALID_CHOICE_MSG)),
        n if n <= items.len() => Ok(MenuSelection::Provider(items[n - 1].provider)),
        n if n == items.len() + 1 => Ok(MenuSelection::Cancel),
        _ => Err(UiError::new(INVALID_CHOICE_MSG)),
    }
}

pub fn parse_confirmation(input: &str) -> Result<ConfirmationChoice, UiError> {
    match input.trim().to_lowercase().as_str() {
        "" | "n" | "no" => Ok(ConfirmationChoice::No),
        "y" | "yes" => Ok(ConfirmationChoice::Yes),
        _ => Err(UiError::new("Invalid confirmation response")),
    }
}

pub fn prompt_provider_menu(items: &[ProviderMenuItem]) -> Result<MenuSelection, UiError> {
    println!("Available providers:");
    for (index, item) in items.iter().enumerate() {
        let status = if item.configured {
            "✓ configured"
        } else {
            "not configured"
        };
        println!(
            "  {}. {} ({}) - {}",
            index + 1,
            item.provider.display_name(),
            item.provider.id(),
            status
        );
    }
    println!("  {}. Cancel", items.len() + 1);
    println!();

    let input = read_answer(&format!("Select a provider (1-{}): ", items.len() + 1))?;
    parse_menu_choice(&input, items)
}

/// Ask for a key until it passes validation or the input closes.
pub fn prompt_api_key(display_name: &str) -> Result<String, UiError> {
    println!("Provider: {display_name}");
    loop {
        let input = read_answer(KEY_PROMPT)?;
        if input.is_empty() {
            return Err(UiError::new("Input closed"));
        }
        match validate_api_key(&input) {
            Ok(key) => return Ok(key),
            Err(err) => println!("{err}"),
        }
    }
}

pub fn interactive_auth(
    store: &dyn CredentialStore,
    provider: Option<Provider>,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = match provider {
        Some(provider) => provider,
        None => match prompt_provider_menu(&menu_items(store))? {
            MenuSelection::Provider(provider) => provider,
            MenuSelection::Cancel => {
                println!("Cancelled.");
                return Ok(());
            }
        },
    };

    let key = prompt_api_key(provider.display_name())?;
    store.set(provider, &key)?;
    println!("✓ Key stored securely for {}", provider.display_name());
    Ok(())
}

pub fn interactive_deauth(
    store: &dyn CredentialStore,
    provider: Option<Provider>,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = match provider {
        Some(provider) => provider,
        None => {
            let configured: Vec<_> = menu_items(store)
                .into_iter()
                .filter(|item| item.configured)
                .collect();
            if configured.is_empty() {
                println!("No configured providers found.");
                return Ok(());
            }
            match prompt_provider_menu(&configured)? {
                MenuSelection::Provider(provider) => provider,
                MenuSelection::Cancel => {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
        }
    };

    if store.get(provider)?.is_none() {
        return Err(format!("{} has no stored key.", provider.display_name()).into());
    }

    let answer = read_answer(&format!(
        "Remove the stored key for {}? (y/N): ",
        provider.display_name()
    ))?;
    match parse_confirmation(&answer)? {
        ConfirmationChoice::Yes => {
            store.remove(provider)?;
            println!("✅ Key removed for {}", provider.display_name());
        }
        ConfirmationChoice::No => println!("Cancelled."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    fn items() -> Vec<ProviderMenuItem> {
        let store = MemoryCredentialStore::new().with_secret(Provider::OpenRouter, "sk-or");
        menu_items(&store)
    }

    #[test]
    fn menu_reports_configured_providers() {
        let items = items();
        assert_eq!(items.len(), 2);
        assert!(!items[0].configured);
        assert!(items[1].configured);
    }

    #[test]
    fn menu_choice_maps_numbers_to_providers() {
        let items = items();
        assert_eq!(
            parse_menu_choice("2\n", &items).unwrap(),
            MenuSelection::Provider(Provider::OpenRouter)
        );
        assert_eq!(parse_menu_choice("3", &items).unwrap(), MenuSelection::Cancel);
        assert!(parse_menu_choice("0", &items).is_err());
        assert!(parse_menu_choice("x", &items).is_err());
        assert!(parse_menu_choice("", &items).is_err());
    }

    #[test]
    fn confirmation_defaults_to_no() {
        assert_eq!(parse_confirmation(" ").unwrap(), ConfirmationChoice::No);
        assert_eq!(parse_confirmation("YES").unwrap(), ConfirmationChoice::Yes);
        assert!(parse_confirmation("maybe").is_err());
    }
}
