use super::{ChatBackend, ChatRequest, MAX_TOKENS, TEMPERATURE};
use crate::config::OpenRouterConfig;
use crate::error::QueryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenRouter chat-completions 客户端
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    http_client: Client,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http_client })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    #[instrument(skip(self, request), level = "debug")]
    async fn complete(&self, request: &ChatRequest) -> Result<String, QueryError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!(
            "OpenRouter request: model={}, prompt {} chars",
            request.model,
            request.prompt.chars().count()
        );
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&request.api_key)
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::info!("OpenRouter responded {} in {:?}", status, start.elapsed());

        if !status.is_success() {
            return Err(QueryError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| QueryError::MalformedResponse(format!("invalid response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| QueryError::MalformedResponse("response has no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_client(base_url: &str, timeout_secs: u64) -> OpenRouterClient {
        let config = OpenRouterConfig {
            base_url: base_url.to_string(),
            timeout_secs,
            ..OpenRouterConfig::default()
        };
        OpenRouterClient::new(config).expect("Failed to create HTTP client")
    }

    fn request() -> ChatRequest {
        ChatRequest {
            api_key: "test-api-key".to_string(),
            model: "openai/gpt-4o".to_string(),
            prompt: "How many invoices?".to_string(),
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "gen-123",
            "model": "openai/gpt-4o",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_complete_returns_content_verbatim() {
        let mock_server = MockServer::start().await;
        let answer = "**100** invoices\n\n| a | b |";

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(header("X-Title", "Invoice Analyzer"))
            .and(body_partial_json(json!({
                "model": "openai/gpt-4o",
                "messages": [{ "role": "user", "content": "How many invoices?" }],
                "max_tokens": 2000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(answer)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), 5);
        let result = client.complete(&request()).await.unwrap();
        assert_eq!(result, answer);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_code_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"No auth\"}"))
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), 5);
        let err = client.complete(&request()).await.unwrap_err();

        assert!(matches!(err, QueryError::Api { status: 401, .. }));
        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("No auth"));
    }

    #[tokio::test]
    async fn test_missing_choices_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), 5);
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), 1);
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
        assert!(err.to_string().starts_with("Error processing query"));
    }
}
