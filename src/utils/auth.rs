//! Provider-specific request headers.

use crate::core::providers::Provider;

/// Add the bearer token plus any headers the provider asks for (OpenRouter
/// wants app attribution via `HTTP-Referer` and `X-Title`).
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    provider: Provider,
    api_key: &str,
) -> reqwest::RequestBuilder {
    provider
        .spec()
        .extra_headers
        .iter()
        .fold(
            request.header("Authorization", format!("Bearer {api_key}")),
            |request, (name, value)| request.header(name.as_str(), value.as_str()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built_headers(provider: Provider) -> reqwest::header::HeaderMap {
        let client = reqwest::Client::new();
        add_auth_headers(client.get("https://example.com"), provider, "sk-test")
            .build()
            .expect("request")
            .headers()
            .clone()
    }

    #[test]
    fn n1n_uses_bearer_only() {
        let headers = built_headers(Provider::N1n);
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert!(headers.get("x-title").is_none());
    }

    #[test]
    fn openrouter_adds_attribution_headers() {
        let headers = built_headers(Provider::OpenRouter);
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(headers["x-title"], "n1n.ai Chat");
        assert!(headers.contains_key("http-referer"));
    }
}
