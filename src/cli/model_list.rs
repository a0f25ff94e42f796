//! Model listing functionality
//!
//! Prints the curated shortlist for a provider, enriched with live pricing and
//! the rest of the provider's catalog when a key is available.

use std::error::Error;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::auth::CredentialStore;
use crate::core::catalog::{CatalogEntry, CatalogListing, ModelCatalog};
use crate::core::chat_client::ChatBackend;
use crate::core::providers::Provider;

pub async fn list_models(
    credentials: &dyn CredentialStore,
    backend: &dyn ChatBackend,
    provider: Option<Provider>,
) -> Result<(), Box<dyn Error>> {
    let provider = provider.unwrap_or_else(|| credentials.active_provider_preference());
    let api_key = credentials.get(provider)?.unwrap_or_default();

    if api_key.is_empty() {
        println!(
            "ℹ️  No key stored for {}; showing the curated list only. Run 'relaychat auth' to add one.",
            provider.display_name()
        );
        println!();
    }

    let listing = ModelCatalog::list(backend, provider, &api_key).await;
    println!("{}", render_listing(&listing));
    Ok(())
}

pub fn render_listing(listing: &CatalogListing) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🤖 Available Models for {}", listing.provider.display_name());
    let _ = writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if let Some(error) = &listing.error {
        let _ = writeln!(out, "⚠️  {error}");
    }

    if listing.popular.is_empty() && listing.others.is_empty() {
        let _ = writeln!(out, "No models found for this provider.");
        return out.trim_end().to_string();
    }

    if !listing.popular.is_empty() {
        let _ = writeln!(out, "⭐ Popular");
        for entry in &listing.popular {
            render_entry(&mut out, entry, listing.provider);
        }
    }
    if !listing.others.is_empty() {
        let _ = writeln!(out, "📚 Other models ({})", listing.others.len());
        for entry in &listing.others {
            render_entry(&mut out, entry, listing.provider);
        }
    }
    out.trim_end().to_string()
}

fn render_entry(out: &mut String, entry: &CatalogEntry, provider: Provider) {
    let marker = if entry.id == provider.default_model() {
        " (default)"
    } else {
        ""
    };
    let _ = writeln!(out, "  • {}{marker}", entry.id);

    if let Some(pricing) = &entry.pricing {
        let prompt = pricing.prompt.as_ref().map(ToString::to_string);
        let completion = pricing.completion.as_ref().map(ToString::to_string);
        match (prompt, completion) {
            (Some(prompt), Some(completion)) => {
                let _ = writeln!(out, "    Price: {prompt} in / {completion} out");
            }
            (Some(prompt), None) => {
                let _ = writeln!(out, "    Price: {prompt} in");
            }
            (None, Some(completion)) => {
                let _ = writeln!(out, "    Price: {completion} out");
            }
            (None, None) => {}
        }
    }

    if let Some(created) = entry.created.and_then(format_created) {
        let _ = writeln!(out, "    Created: {created}");
    }
}

/// Some APIs report creation time in milliseconds, others in seconds.
fn format_created(created: u64) -> Option<String> {
    if created == 0 {
        return None;
    }
    let timestamp_secs = if created > 10_000_000_000 {
        created / 1000
    } else {
        created
    };
    DateTime::<Utc>::from_timestamp(timestamp_secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ModelInfo, ModelPricing, Price};

    #[test]
    fn created_accepts_seconds_and_milliseconds() {
        let seconds = format_created(1_700_000_000).expect("seconds");
        let millis = format_created(1_700_000_000_000).expect("millis");
        assert_eq!(seconds, "2023-11-14 22:13:20 UTC");
        assert_eq!(seconds, millis);
        assert_eq!(format_created(0), None);
    }

    #[test]
    fn listing_shows_pricing_and_other_section() {
        let listing = ModelCatalog::curated(Provider::N1n).augment(vec![
            ModelInfo {
                id: "kimi-k2.5".into(),
                pricing: Some(ModelPricing {
                    prompt: Some(Price::Number(0.6)),
                    completion: Some(Price::Text("2.5".into())),
                }),
                created: Some(1_700_000_000),
            },
            ModelInfo {
                id: "obscure-model".into(),
                pricing: None,
                created: None,
            },
        ]);

        let rendered = render_listing(&listing);
        assert!(rendered.starts_with("🤖 Available Models for n1n.ai"));
        assert!(rendered.contains("  • deepseek-v3.2 (default)"));
        assert!(rendered.contains("  • kimi-k2.5\n    Price: 0.6 in / 2.5 out\n    Created: 2023-11-14"));
        assert!(rendered.contains("📚 Other models (1)\n  • obscure-model"));
    }

    #[test]
    fn error_banner_precedes_curated_entries() {
        let listing = ModelCatalog::curated(Provider::OpenRouter).with_error("Failed to load models");
        let rendered = render_listing(&listing);
        assert!(rendered.contains("⚠️  Failed to load models"));
        assert!(rendered.contains("  • openai/gpt-4o (default)"));
        assert!(!rendered.contains("Other models"));
    }

    #[test]
    fn empty_filter_result_says_so() {
        let listing = ModelCatalog::curated(Provider::N1n).filter("no-such-model");
        assert!(render_listing(&listing).ends_with("No models found for this provider."));
    }
}
