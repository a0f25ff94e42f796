use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::api::ModelInfo;
use crate::auth::{CredentialError, CredentialStore, MemoryCredentialStore};
use crate::core::app::{App, StartupOptions};
use crate::core::chat_client::ChatBackend;
use crate::core::error::ChatError;
use crate::core::message::Message;
use crate::core::providers::Provider;

pub const TEST_KEY: &str = "sk-test";

/// An idle app on n1n with a stored key. The startup greeting is still armed.
pub fn create_test_app() -> App {
    let store = MemoryCredentialStore::new().with_secret(Provider::N1n, TEST_KEY);
    App::initialize(Arc::new(store), StartupOptions::default())
}

pub fn create_test_app_with_store(store: Arc<dyn CredentialStore>) -> App {
    App::initialize(store, StartupOptions::default())
}

/// An app whose store holds no keys at all.
pub fn create_unauthenticated_app() -> App {
    create_test_app_with_store(Arc::new(MemoryCredentialStore::new()))
}

pub fn user_texts(app: &App) -> Vec<&str> {
    app.ui
        .messages
        .iter()
        .filter(|m| m.is_user())
        .map(|m| m.content.as_str())
        .collect()
}

/// Reads fine, fails every write.
pub struct FailingCredentialStore;

impl CredentialStore for FailingCredentialStore {
    fn get(&self, _provider: Provider) -> Result<Option<String>, CredentialError> {
        Ok(None)
    }

    fn set(&self, _provider: Provider, _secret: &str) -> Result<(), CredentialError> {
        Err(CredentialError::Config("disk full".into()))
    }

    fn remove(&self, _provider: Provider) -> Result<(), CredentialError> {
        Err(CredentialError::Config("disk full".into()))
    }

    fn active_provider_preference(&self) -> Provider {
        Provider::N1n
    }

    fn set_active_provider_preference(&self, _provider: Provider) -> Result<(), CredentialError> {
        Err(CredentialError::Config("disk full".into()))
    }
}

/// Scripted [`ChatBackend`] that counts its calls.
pub struct FakeBackend {
    reply: Option<Result<String, ChatError>>,
    models: Result<Vec<ModelInfo>, ChatError>,
    completion_calls: AtomicUsize,
    model_list_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Some(Ok(text.to_string())))
    }

    pub fn failing(error: ChatError) -> Self {
        Self::with_reply(Some(Err(error)))
    }

    /// Completions never resolve.
    pub fn hanging() -> Self {
        Self::with_reply(None)
    }

    fn with_reply(reply: Option<Result<String, ChatError>>) -> Self {
        Self {
            reply,
            models: Ok(Vec::new()),
            completion_calls: AtomicUsize::new(0),
            model_list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_models(mut self, models: Result<Vec<ModelInfo>, ChatError>) -> Self {
        self.models = models;
        self
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }

    pub fn model_list_calls(&self) -> usize {
        self.model_list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn complete(
        &self,
        _provider: Provider,
        _api_key: &str,
        _model: &str,
        _history: &[Message],
    ) -> Result<String, ChatError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => reply.clone(),
            None => std::future::pending().await,
        }
    }

    async fn list_models(
        &self,
        _provider: Provider,
        _api_key: &str,
    ) -> Result<Vec<ModelInfo>, ChatError> {
        self.model_list_calls.fetch_add(1, Ordering::SeqCst);
        self.models.clone()
    }
}

/// A client that ignores proxy environment variables so requests reach the
/// local mock server.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client should build")
}

pub struct MockResponse {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }

    fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Status",
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub struct MockServer {
    pub base_url: String,
    handle: JoinHandle<Result<Vec<CapturedRequest>, String>>,
}

impl MockServer {
    /// Wait until every scripted response has been served.
    pub async fn finish(self) -> Vec<CapturedRequest> {
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("mock server timed out waiting for requests")
            .expect("mock server task panicked")
            .expect("mock server failed")
    }
}

/// Serve `responses` in order, one connection each.
pub async fn spawn_mock_server(responses: Vec<MockResponse>) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");

    let handle = tokio::spawn(async move {
        let mut captured = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
            captured.push(read_http_request(&mut stream).await?);
            stream
                .write_all(response.to_http().as_bytes())
                .await
                .map_err(|err| err.to_string())?;
            let _ = stream.shutdown().await;
        }
        Ok(captured)
    });

    MockServer {
        base_url: format!("http://{addr}"),
        handle,
    }
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.ok_or("header end should exist")?;
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length - body.len()];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}
