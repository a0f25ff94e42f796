use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::core::providers::Provider;

/// Provider, key and model as one unit, plus the request generation that
/// tags every outgoing completion.
pub struct SessionContext {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    /// Bumped by every send and every reset; replies carrying an older value
    /// are dropped.
    pub epoch: u64,
    pub catalog_epoch: u64,
    pub cancel_token: Option<CancellationToken>,
    pub credentials: Arc<dyn CredentialStore>,
}

/// Command-line choices that take precedence over persisted ones.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub provider: Option<Provider>,
    pub model: Option<String>,
}

impl SessionContext {
    pub fn bootstrap(credentials: Arc<dyn CredentialStore>, options: &StartupOptions) -> Self {
        let provider = options
            .provider
            .unwrap_or_else(|| credentials.active_provider_preference());
        let model = options
            .model
            .clone()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        let mut session = SessionContext {
            provider,
            api_key: String::new(),
            model,
            epoch: 0,
            catalog_epoch: 0,
            cancel_token: None,
            credentials,
        };
        session.api_key = session.stored_key(provider);
        session
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The stored secret for `provider`, empty when absent or unreadable.
    pub fn stored_key(&self, provider: Provider) -> String {
        match self.credentials.get(provider) {
            Ok(secret) => secret.unwrap_or_default(),
            Err(err) => {
                warn!(provider = %provider, error = %err, "Could not read stored API key");
                String::new()
            }
        }
    }

    /// Cancel whatever is in flight and open a new generation for a request.
    pub fn start_request(&mut self) -> (CancellationToken, u64) {
        self.cancel_token_if_any();
        self.epoch += 1;

        let token = CancellationToken::new();
        self.cancel_token = Some(token.clone());
        (token, self.epoch)
    }

    /// Cancel the in-flight request (if any) and retire its generation.
    pub fn cancel_in_flight(&mut self) {
        self.cancel_token_if_any();
        self.epoch += 1;
    }

    fn cancel_token_if_any(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            debug!(epoch = self.epoch, "Cancelling in-flight request");
            token.cancel();
        }
    }

    pub fn finish_request(&mut self) {
        self.cancel_token = None;
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    pub fn next_catalog_epoch(&mut self) -> u64 {
        self.catalog_epoch += 1;
        self.catalog_epoch
    }
}
