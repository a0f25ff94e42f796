//! Running completion requests off the state-owning task.
//!
//! [`ChatBackend`] is the seam between the session and the network; the HTTP
//! implementation wraps [`crate::api`]. [`CompletionService`] runs one
//! request per spawned task and reports back tagged with the epoch the
//! request was issued under.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::completions::send_completion;
use crate::api::models::fetch_models;
use crate::api::ModelInfo;
use crate::core::error::ChatError;
use crate::core::message::Message;
use crate::core::providers::Provider;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        provider: Provider,
        api_key: &str,
        model: &str,
        history: &[Message],
    ) -> Result<String, ChatError>;

    async fn list_models(
        &self,
        provider: Provider,
        api_key: &str,
    ) -> Result<Vec<ModelInfo>, ChatError>;
}

#[derive(Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url_override: Option<String>,
}

impl HttpChatBackend {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url_override: None,
        }
    }

    /// Point every provider at one base URL (local proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    fn base_url(&self, provider: Provider) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or(&provider.spec().base_url)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(
        &self,
        provider: Provider,
        api_key: &str,
        model: &str,
        history: &[Message],
    ) -> Result<String, ChatError> {
        send_completion(
            &self.client,
            self.base_url(provider),
            provider,
            api_key,
            model,
            history,
        )
        .await
    }

    async fn list_models(
        &self,
        provider: Provider,
        api_key: &str,
    ) -> Result<Vec<ModelInfo>, ChatError> {
        fetch_models(&self.client, self.base_url(provider), provider, api_key).await
    }
}

/// Everything a spawned request needs, captured at send time.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub history: Vec<Message>,
    pub epoch: u64,
    pub cancel_token: CancellationToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub epoch: u64,
    pub result: Result<String, ChatError>,
}

#[derive(Clone)]
pub struct CompletionService {
    backend: Arc<dyn ChatBackend>,
    tx: mpsc::UnboundedSender<CompletionOutcome>,
}

impl CompletionService {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
    ) -> (Self, mpsc::UnboundedReceiver<CompletionOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { backend, tx }, rx)
    }

    /// Run the request; a cancelled request reports nothing.
    pub fn spawn(&self, request: CompletionRequest) -> tokio::task::JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let CompletionRequest {
                provider,
                api_key,
                model,
                history,
                epoch,
                cancel_token,
            } = request;

            tokio::select! {
                result = backend.complete(provider, &api_key, &model, &history) => {
                    let _ = tx.send(CompletionOutcome { epoch, result });
                }
                _ = cancel_token.cancelled() => {
                    debug!(epoch, "Completion request cancelled");
                }
            }
        })
    }
}
