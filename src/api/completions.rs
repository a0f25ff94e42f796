use tracing::debug;

use crate::api::{ChatMessage, ChatRequest, ChatResponse, MessageContent, DEFAULT_TEMPERATURE};
use crate::core::attachments::encode_user_content;
use crate::core::error::ChatError;
use crate::core::message::{Message, Role};
use crate::core::providers::Provider;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

/// Translate the conversation into wire messages. User turns go through the
/// attachment encoder; assistant turns are sent as plain text.
pub fn to_api_messages(history: &[Message]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|message| match message.role {
            Role::User => ChatMessage {
                role: Role::User.as_str().to_string(),
                content: encode_user_content(&message.content, &message.attachments),
            },
            Role::Assistant => ChatMessage {
                role: Role::Assistant.as_str().to_string(),
                content: MessageContent::Text(message.content.clone()),
            },
        })
        .collect()
}

/// Text of the first choice; empty when the provider sent none.
pub fn extract_assistant_text(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(MessageContent::into_text)
        .unwrap_or_default()
}

pub async fn send_completion(
    client: &reqwest::Client,
    base_url: &str,
    provider: Provider,
    api_key: &str,
    model: &str,
    history: &[Message],
) -> Result<String, ChatError> {
    if api_key.is_empty() {
        return Err(ChatError::NoCredential);
    }

    let request = ChatRequest {
        model: model.to_string(),
        messages: to_api_messages(history),
        temperature: DEFAULT_TEMPERATURE,
    };

    let chat_url = construct_api_url(base_url, "chat/completions");
    debug!(provider = %provider, model, url = %chat_url, turns = history.len(), "Sending completion request");

    let http_request = client
        .post(chat_url)
        .header("Content-Type", "application/json");
    let response = add_auth_headers(http_request, provider, api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        debug!(status = status.as_u16(), body = %error_text, "Completion request failed");
        return Err(ChatError::from_status(status.as_u16(), &error_text));
    }

    let body = response.text().await?;
    let parsed: ChatResponse = serde_json::from_str(&body)
        .map_err(|err| ChatError::Unknown(format!("Invalid response from provider: {err}")))?;
    Ok(extract_assistant_text(parsed))
}
