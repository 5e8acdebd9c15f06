//! Shared HTTP plumbing for JSON APIs

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ProviderError, ProviderResult};

/// `{"error": {"message": ...}}`, used by both Anthropic and OpenAI-style APIs
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull a readable message out of an error body
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// POST a JSON body and decode a JSON reply, mapping HTTP failures
pub(crate) async fn post_json<B, R>(
    request: RequestBuilder,
    body: &B,
    provider: &str,
) -> ProviderResult<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| ProviderError::transport(provider, e))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::transport(provider, e))?;

    if status.as_u16() == 429 {
        return Err(ProviderError::rate_limited(provider, error_message(&text)));
    }
    if !status.is_success() {
        return Err(ProviderError::status(
            provider,
            status.as_u16(),
            error_message(&text),
        ));
    }

    decode_body(provider, &text)
}

/// Decode a success body into the adapter's wire type
pub(crate) fn decode_body<R: DeserializeOwned>(provider: &str, text: &str) -> ProviderResult<R> {
    serde_json::from_str(text).map_err(|e| ProviderError::decode(provider, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_parsing() {
        assert_eq!(
            error_message(r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens: required"}}"#),
            "max_tokens: required"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message("  "), "empty response body");
    }

    #[test]
    fn test_undecodable_body() {
        #[derive(Debug, Deserialize)]
        struct Reply {
            #[allow(dead_code)]
            id: String,
        }

        let err = decode_body::<Reply>("groq", "<html>gateway</html>").unwrap_err();
        assert!(matches!(&err, ProviderError::Decode { provider, .. } if provider == "groq"));

        let err = decode_body::<Reply>("groq", r#"{"object":"chat.completion"}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
    }
}
