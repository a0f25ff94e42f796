use std::time::{Duration, Instant};

use crate::core::catalog::{CatalogListing, ModelCatalog};
use crate::core::message::Message;
use crate::core::providers::Provider;

pub const TOAST_DURATION: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_DURATION
    }
}

/// Everything the front end renders from.
pub struct UiState {
    pub messages: Vec<Message>,
    /// True strictly between a send and its resolution.
    pub loading: bool,
    /// Send the greeting as soon as a credential arrives.
    pub pending_greeting: bool,
    /// One-shot greeting for a session that started with a key.
    pub startup_greeting: bool,
    pub credential_entry_open: bool,
    pub model_picker_open: bool,
    pub toast: Option<Toast>,
    pub catalog: CatalogListing,
    pub catalog_loading: bool,
}

impl UiState {
    pub fn new(provider: Provider) -> Self {
        Self {
            messages: Vec::new(),
            loading: false,
            pending_greeting: false,
            startup_greeting: false,
            credential_entry_open: false,
            model_picker_open: false,
            toast: None,
            catalog: ModelCatalog::curated(provider),
            catalog_loading: false,
        }
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message));
    }

    /// Credential entry with the greeting armed for when it completes.
    pub fn request_credential(&mut self) {
        self.credential_entry_open = true;
        self.pending_greeting = true;
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_expires_after_its_duration() {
        let toast = Toast::new("hi");
        assert!(!toast.is_expired(toast.shown_at));
        assert!(!toast.is_expired(toast.shown_at + Duration::from_millis(2499)));
        assert!(toast.is_expired(toast.shown_at + TOAST_DURATION));
    }

    #[test]
    fn new_state_shows_curated_catalog() {
        let ui = UiState::new(Provider::OpenRouter);
        assert_eq!(ui.catalog.provider, Provider::OpenRouter);
        assert!(!ui.catalog.popular.is_empty());
        assert!(ui.messages.is_empty());
        assert!(!ui.loading);
    }
}
