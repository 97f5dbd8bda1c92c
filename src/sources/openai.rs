use std::borrow::Cow;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReasoningConfig;
use crate::error::TrialMatchError;

pub(crate) const OPENAI_API: &str = "openai";

/// One-shot text completion. Implemented by the HTTP client below and by
/// test doubles.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Returns the model's text, or `None` when the response carries no content.
    async fn complete(&self, prompt: &str, max_tokens: u32)
    -> Result<Option<String>, TrialMatchError>;
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    base: Cow<'static, str>,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|v| !v.is_empty())
    }
}

impl ChatCompletionClient {
    pub fn new(config: &ReasoningConfig) -> Result<Self, TrialMatchError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(TrialMatchError::MissingCredential("OpenAI"))?;
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: config.base.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        crate::sources::join_endpoint(&self.base, path)
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Option<String>, TrialMatchError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        };

        let resp = self
            .client
            .post(self.endpoint("chat/completions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        debug!(api = OPENAI_API, model = %self.model, %status, "completion responded");
        let bytes = crate::sources::read_limited_body(resp, OPENAI_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialMatchError::Api {
                api: OPENAI_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_slice(&bytes).map_err(|source| TrialMatchError::ApiJson {
                api: OPENAI_API.to_string(),
                source,
            })?;
        Ok(parsed.first_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ReasoningConfig {
        ReasoningConfig {
            api_key: Some("sk-test".into()),
            model: "gpt-3.5-turbo".into(),
            base: Cow::Owned(server.uri()),
        }
    }

    #[test]
    fn new_requires_credential() {
        let err = ChatCompletionClient::new(&ReasoningConfig::disabled())
            .err()
            .unwrap();
        assert!(matches!(err, TrialMatchError::MissingCredential(_)));
    }

    #[tokio::test]
    async fn complete_sends_single_user_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 200,
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "You may qualify." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();
        let text = client.complete("hello", 200).await.unwrap();
        assert_eq!(text.as_deref(), Some("You may qualify."));
    }

    #[tokio::test]
    async fn complete_returns_none_without_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": null } }]
            })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();
        assert_eq!(client.complete("hello", 200).await.unwrap(), None);
    }

    #[tokio::test]
    async fn complete_reports_auth_failures() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "error": { "message": "bad key" } })),
            )
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(&config_for(&server)).unwrap();
        let err = client.complete("hello", 200).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
