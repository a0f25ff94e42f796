//! Model catalog: the curated shortlist, optionally enriched by a live
//! `/models` listing.
//!
//! The curated list is available immediately and never depends on the
//! network. A successful fetch only adds pricing to curated entries and
//! appends the remaining models; a failed fetch leaves the curated list as it
//! was and records an error for display.

use tracing::warn;

use crate::api::{ModelInfo, ModelPricing};
use crate::core::chat_client::ChatBackend;
use crate::core::providers::Provider;

/// Non-curated models shown after the shortlist.
pub const MAX_OTHER_MODELS: usize = 50;
pub const CATALOG_LOAD_ERROR: &str = "Failed to load models";

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub pricing: Option<ModelPricing>,
    pub created: Option<u64>,
}

impl CatalogEntry {
    fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            pricing: None,
            created: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogListing {
    pub provider: Provider,
    pub popular: Vec<CatalogEntry>,
    pub others: Vec<CatalogEntry>,
    pub error: Option<String>,
}

impl CatalogListing {
    /// Merge a live listing: pricing is matched by id, everything not
    /// curated goes to `others` sorted by id.
    pub fn augment(mut self, models: Vec<ModelInfo>) -> Self {
        let spec = self.provider.spec();
        for entry in &mut self.popular {
            if let Some(live) = models.iter().find(|m| m.id == entry.id) {
                entry.pricing = live.pricing.clone();
                entry.created = live.created;
            }
        }

        let mut others: Vec<CatalogEntry> = models
            .into_iter()
            .filter(|m| !spec.is_popular(&m.id))
            .map(|m| CatalogEntry {
                id: m.id,
                pricing: m.pricing,
                created: m.created,
            })
            .collect();
        others.sort_by(|a, b| a.id.cmp(&b.id));
        others.dedup_by(|a, b| a.id == b.id);
        others.truncate(MAX_OTHER_MODELS);
        self.others = others;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.popular.iter().chain(self.others.iter())
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.entries().any(|entry| entry.id == model_id)
    }

    /// Case-insensitive substring search over both sections.
    pub fn filter(&self, query: &str) -> CatalogListing {
        let needle = query.trim().to_lowercase();
        let keep = |entry: &&CatalogEntry| entry.id.to_lowercase().contains(&needle);
        CatalogListing {
            provider: self.provider,
            popular: self.popular.iter().filter(keep).cloned().collect(),
            others: self.others.iter().filter(keep).cloned().collect(),
            error: self.error.clone(),
        }
    }
}

/// A catalog fetch issued by the model picker, tagged so a late result for
/// an earlier picker session can be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub provider: Provider,
    pub api_key: String,
    pub epoch: u64,
}

pub struct ModelCatalog;

impl ModelCatalog {
    /// The provider's curated shortlist with no pricing.
    pub fn curated(provider: Provider) -> CatalogListing {
        CatalogListing {
            provider,
            popular: provider
                .spec()
                .popular_models
                .iter()
                .map(|id| CatalogEntry::bare(id))
                .collect(),
            others: Vec::new(),
            error: None,
        }
    }

    /// Build the listing for `provider`. Without a key no request is made.
    pub async fn list(
        backend: &dyn ChatBackend,
        provider: Provider,
        api_key: &str,
    ) -> CatalogListing {
        let curated = Self::curated(provider);
        if api_key.is_empty() {
            return curated;
        }

        match backend.list_models(provider, api_key).await {
            Ok(models) => curated.augment(models),
            Err(err) => {
                warn!(provider = %provider, error = %err, "Model list fetch failed");
                curated.with_error(CATALOG_LOAD_ERROR)
            }
        }
    }
}
