use tracing::debug;

use crate::api::{ModelInfo, ModelsResponse};
use crate::core::error::ChatError;
use crate::core::providers::Provider;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
    provider: Provider,
    api_key: &str,
) -> Result<Vec<ModelInfo>, ChatError> {
    let models_url = construct_api_url(base_url, "models");
    debug!(provider = %provider, url = %models_url, "Fetching model list");

    let request = client
        .get(models_url)
        .header("Content-Type", "application/json");
    let response = add_auth_headers(request, provider, api_key).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ChatError::from_status(status.as_u16(), &error_text));
    }

    let body = response.text().await?;
    let models: ModelsResponse = serde_json::from_str(&body)
        .map_err(|err| ChatError::Unknown(format!("Unexpected model list format: {err}")))?;
    Ok(models.into_models())
}
