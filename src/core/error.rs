//! Failure categories for completion and catalog requests.
//!
//! Every failure of a send is rendered as an assistant turn; the category
//! decides the wording and whether the credential prompt is reopened.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// No API key for the active provider; the request never left the client.
    NoCredential,
    /// 401/403 from the provider.
    AuthRejected { status: u16 },
    /// 429 from the provider.
    RateLimited,
    /// Any 5xx from the provider.
    ServerError { status: u16 },
    /// Other statuses, transport failures, and unreadable responses.
    Unknown(String),
}

impl ChatError {
    /// Classify a non-success HTTP status. The body only feeds `Unknown`.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ChatError::AuthRejected { status },
            429 => ChatError::RateLimited,
            500..=599 => ChatError::ServerError { status },
            _ => {
                let summary = summarize_body(body);
                if summary.is_empty() {
                    ChatError::Unknown(format!("Request failed with status code {status}"))
                } else {
                    ChatError::Unknown(format!(
                        "Request failed with status code {status}: {summary}"
                    ))
                }
            }
        }
    }

    /// Text shown to the user as the synthetic assistant message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::NoCredential => "🔑 Enter an API key to continue".to_string(),
            ChatError::AuthRejected { .. } => "❌ Invalid API key".to_string(),
            ChatError::RateLimited => "⚠️ Rate limit exceeded".to_string(),
            ChatError::ServerError { .. } => "❌ Server error, please try again later".to_string(),
            ChatError::Unknown(message) => format!("❌ Error: {message}"),
        }
    }

    pub fn reopens_credential_entry(&self) -> bool {
        matches!(self, ChatError::NoCredential | ChatError::AuthRejected { .. })
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::NoCredential => write!(f, "no API key configured"),
            ChatError::AuthRejected { status } => {
                write!(f, "provider rejected the API key (status {status})")
            }
            ChatError::RateLimited => write!(f, "provider rate limit exceeded (status 429)"),
            ChatError::ServerError { status } => write!(f, "provider server error (status {status})"),
            ChatError::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ChatError {}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ChatError::from_status(status.as_u16(), ""),
            None => ChatError::Unknown(err.to_string()),
        }
    }
}

/// Pull a one-line summary out of an error body; providers usually send
/// `{"error":{"message":…}}`.
fn summarize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let summary = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .or_else(|| value.get("error").and_then(|v| v.as_str()))
                .or_else(|| value.get("message").and_then(|v| v.as_str()))
                .map(str::to_owned)
        })
        .unwrap_or_else(|| trimmed.to_string());

    summary.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_reopen_credential_entry() {
        for status in [401, 403] {
            let err = ChatError::from_status(status, "");
            assert_eq!(err, ChatError::AuthRejected { status });
            assert!(err.reopens_credential_entry());
            assert_eq!(err.user_message(), "❌ Invalid API key");
        }
    }

    #[test]
    fn rate_limit_does_not_reopen_credential_entry() {
        let err = ChatError::from_status(429, "slow down");
        assert_eq!(err, ChatError::RateLimited);
        assert!(!err.reopens_credential_entry());
        assert_eq!(err.user_message(), "⚠️ Rate limit exceeded");
    }

    #[test]
    fn server_errors_use_generic_message() {
        let err = ChatError::from_status(503, "<html>down</html>");
        assert_eq!(err, ChatError::ServerError { status: 503 });
        assert_eq!(err.user_message(), "❌ Server error, please try again later");
    }

    #[test]
    fn other_statuses_surface_error_summary() {
        let err = ChatError::from_status(
            400,
            r#"{"error":{"message":"model   not\nfound","type":"invalid_request_error"}}"#,
        );
        assert_eq!(
            err.user_message(),
            "❌ Error: Request failed with status code 400: model not found"
        );
    }

    #[test]
    fn empty_body_still_names_the_status() {
        let err = ChatError::from_status(404, "  ");
        assert_eq!(
            err,
            ChatError::Unknown("Request failed with status code 404".into())
        );
    }
}
