//! HTTP model client for chat-completions-compatible endpoints.
//!
//! Talks directly to any `/chat/completions` API (OpenAI, gateways, local
//! inference servers) via `reqwest`. The gateway or provider behind the URL
//! is opaque to the loop.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::StatusCode;
use tracing::{debug, warn};

use reagent_core::config::ModelSettings;
use reagent_core::error::ModelError;
use reagent_core::types::{ChatRequest, ChatResponse, Message, ModelReply, ToolDefinition};

use crate::traits::ModelClient;

// ─────────────────────────────────────────────
// HttpModelClient
// ─────────────────────────────────────────────

/// A model client that POSTs to an OpenAI-compatible HTTP API.
pub struct HttpModelClient {
    /// HTTP client (shared, connection-pooled). No request timeout here;
    /// the orchestrator owns the per-call deadline.
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Model identifier sent with each request.
    model: String,
    /// Sampling settings.
    settings: ModelSettings,
    /// Extra headers for gateway-specific routing.
    extra_headers: HeaderMap,
}

impl std::fmt::Debug for HttpModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpModelClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpModelClient {
    /// Create a new client for the given endpoint and model.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        HttpModelClient {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            settings: ModelSettings::default(),
            extra_headers: HeaderMap::new(),
        }
    }

    /// Override the sampling settings (builder pattern).
    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Add an extra header sent with each request. Invalid names/values are
    /// logged and dropped.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(val)) => {
                self.extra_headers.insert(name, val);
            }
            _ => warn!(key, value, "invalid extra header, ignoring"),
        }
        self
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ModelError> {
        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "calling model"
        );

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            tools: if tools.is_empty() {
                None
            } else {
                Some(tools.to_vec())
            },
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ModelError::unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            warn!(model = %self.model, ?retry_after, "rate limited by upstream");
            return Err(ModelError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            warn!(model = %self.model, status = %status, body = %body, "upstream error");
            return Err(ModelError::unavailable(format!("{status} — {body}")));
        }

        let wire: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::malformed(e.to_string()))?;

        let reply = ModelReply::from_wire(wire)?;
        debug!(
            model = %self.model,
            has_content = reply.content.is_some(),
            tool_calls = reply.tool_calls.len(),
            finish_reason = reply.finish_reason.as_deref().unwrap_or("?"),
            "model reply received"
        );
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Parse a `Retry-After` value: delta-seconds, or an HTTP-date which becomes
/// the time remaining until that instant. A date in the past yields `None`.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    date.signed_duration_since(chrono::Utc::now()).to_std().ok()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // ── Unit tests ──

    #[test]
    fn test_completions_url_trailing_slash() {
        let client = HttpModelClient::new("https://api.openai.com/v1/", "key", "gpt-4o");
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_completions_url_no_trailing_slash() {
        let client = HttpModelClient::new("https://api.openai.com/v1", "key", "gpt-4o");
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after(" 7 "), Some(Duration::from_secs(7)));

        let soon = (chrono::Utc::now() + chrono::TimeDelta::seconds(30)).to_rfc2822();
        let wait = parse_retry_after(&soon).unwrap();
        assert!(wait > Duration::from_secs(25) && wait <= Duration::from_secs(30));

        let past = (chrono::Utc::now() - chrono::TimeDelta::seconds(30)).to_rfc2822();
        assert_eq!(parse_retry_after(&past), None);

        assert_eq!(parse_retry_after("whenever"), None);
    }

    #[test]
    fn test_invalid_extra_header_dropped() {
        let client = HttpModelClient::new("http://x", "key", "gpt-4o")
            .with_header("x-route-hint", "weather")
            .with_header("bad header\n", "v");
        assert_eq!(client.extra_headers.len(), 1);
        assert!(client.extra_headers.contains_key("x-route-hint"));
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_complete_final_reply() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-test",
                "choices": [{
                    "message": {
                        "content": "Fermat's last theorem states…",
                        "tool_calls": null
                    },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 5,
                    "total_tokens": 15
                }
            })))
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "test-key-123", "gpt-4o");
        let messages = vec![Message::user("Tell me about Fermat's last theorem")];

        let reply = client.complete(&messages, &[]).await.unwrap();
        assert!(reply.is_final());
        assert_eq!(reply.content.as_deref(), Some("Fermat's last theorem states…"));
        assert_eq!(reply.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_complete_tool_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-tools",
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc123",
                            "type": "function",
                            "function": {
                                "name": "get_weather",
                                "arguments": "{\"location\": \"San Francisco\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "key", "gpt-4o");
        let tools = vec![ToolDefinition::new(
            "get_weather",
            "Look up current weather",
            json!({"type": "object", "properties": {"location": {"type": "string"}}}),
        )];
        let messages = vec![Message::user("Weather in SF?")];

        let reply = client.complete(&messages, &tools).await.unwrap();
        assert!(reply.has_tool_calls());
        assert_eq!(reply.tool_calls[0].id, "call_abc123");
        assert_eq!(reply.tool_calls[0].function.name, "get_weather");
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_json(json!({"error": {"message": "Rate limit exceeded"}})),
            )
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "key", "gpt-4o");
        let err = client
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();

        match err {
            ModelError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_server_error_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "key", "gpt-4o");
        let err = client
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();

        match err {
            ModelError::Unavailable { detail } => {
                assert!(detail.contains("503"));
                assert!(detail.contains("upstream down"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_network_error_is_unavailable() {
        // Point to a port that's not listening
        let client = HttpModelClient::new("http://127.0.0.1:1", "key", "gpt-4o");
        let err = client
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_complete_unparseable_body_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "key", "gpt-4o");
        let err = client
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_complete_empty_reply_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-empty",
                "choices": [{
                    "message": { "content": "", "tool_calls": [] },
                    "finish_reason": "stop"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "key", "gpt-4o");
        let err = client
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_complete_sends_correct_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "max_tokens": 4096,
                "tool_choice": "auto"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-body",
                "choices": [{
                    "message": { "content": "ok" },
                    "finish_reason": "stop"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "key", "gpt-4o");
        let tools = vec![ToolDefinition::new("t", "d", json!({"type": "object"}))];

        // If the body matcher fails, wiremock returns 404 → Unavailable
        let reply = client
            .complete(&[Message::user("test")], &tools)
            .await
            .unwrap();
        assert_eq!(reply.content.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_complete_no_tools_omits_tool_fields() {
        let mock_server = MockServer::start().await;

        // tool_choice must be absent when no tools are offered.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-no-tools",
                "choices": [{
                    "message": { "content": "ok" },
                    "finish_reason": "stop"
                }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let client = HttpModelClient::new(mock_server.uri(), "key", "gpt-4o");
        let reply = client.complete(&[Message::user("test")], &[]).await.unwrap();
        assert!(reply.is_final());
    }
}
