use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::config::ClientConfig;

use super::types::{Completion, CompletionRequest};
use super::AssistantError;

/// The external language-model endpoint. Injected, never a global.
pub trait CompletionService {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<Completion, AssistantError>> + Send;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::UpstreamService(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `AI_DOCTOR_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AssistantError> {
        Self::new(&ClientConfig::from_lookup(lookup)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Response body of `/chat/completions`.
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u32,
}

impl CompletionService for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AssistantError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AssistantError::UpstreamService(format!("Cannot reach {}", self.base_url))
                } else if e.is_timeout() {
                    AssistantError::UpstreamService(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    AssistantError::UpstreamService(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Completion service returned an error");
            return Err(AssistantError::UpstreamService(format!(
                "HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::UpstreamService(format!("Unreadable response: {e}")))?;

        into_completion(parsed, &request.model)
    }
}

fn into_completion(
    parsed: ChatCompletionResponse,
    requested_model: &str,
) -> Result<Completion, AssistantError> {
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| AssistantError::UpstreamService("Response has no choices".into()))?;

    Ok(Completion {
        text,
        model: if parsed.model.is_empty() {
            requested_model.to_string()
        } else {
            parsed.model
        },
        total_tokens: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
    })
}

/// Scripted completion service for tests. Records every request it receives.
#[cfg(test)]
pub struct MockCompletion {
    reply: Result<String, String>,
    delay: Option<Duration>,
    pub requests: std::sync::Mutex<Vec<CompletionRequest>>,
}

#[cfg(test)]
impl MockCompletion {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            delay: None,
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Answer only after `delay`, like a real endpoint under load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recorded(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl CompletionService for MockCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AssistantError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                model: request.model.clone(),
                total_tokens: 42,
            }),
            Err(message) => Err(AssistantError::UpstreamService(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn trailing_slash_removed_from_base_url() {
        let mut config = ClientConfig::new("sk-test");
        config.base_url = "http://localhost:8080/v1/".into();
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let err = OpenAiClient::from_lookup(|_| None).unwrap_err();
        assert!(matches!(
            err,
            AssistantError::Config(ConfigError::Missing("OPENAI_API_KEY"))
        ));

        let client = OpenAiClient::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".into()),
            "OPENAI_BASE_URL" => Some("http://localhost:11434/v1/".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434/v1");
    }

    #[test]
    fn response_body_maps_to_completion() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Nabız yüksek."}}],
                "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
            }"#,
        )
        .unwrap();
        let completion = into_completion(parsed, "gpt-4o-mini").unwrap();
        assert_eq!(completion.text, "Nabız yüksek.");
        assert_eq!(completion.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(completion.total_tokens, 120);
    }

    #[test]
    fn empty_choices_is_upstream_failure() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"model": "", "choices": []}"#).unwrap();
        let err = into_completion(parsed, "gpt-4o-mini").unwrap_err();
        assert!(matches!(err, AssistantError::UpstreamService(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_upstream_failure() {
        let mut config = ClientConfig::new("sk-test");
        // Reserved port on loopback; nothing listens there.
        config.base_url = "http://127.0.0.1:9".into();
        config.timeout_secs = 2;
        let client = OpenAiClient::new(&config).unwrap();
        let request = CompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![],
            temperature: 0.7,
            max_tokens: None,
        };
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, AssistantError::UpstreamService(_)));
    }

    #[tokio::test]
    async fn mock_records_requests() {
        let mock = MockCompletion::new("tamam");
        let request = CompletionRequest {
            model: "m".into(),
            messages: vec![],
            temperature: 0.0,
            max_tokens: None,
        };
        let completion = mock.complete(&request).await.unwrap();
        assert_eq!(completion.text, "tamam");
        assert_eq!(mock.recorded().len(), 1);
    }
}
