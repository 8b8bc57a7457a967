//! HTTP chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::ChatError;
use crate::user_agent;

/// Default chat completion endpoint.
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Environment variable holding the bearer token by default.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Sampling temperature sent with every request.
pub const CHAT_TEMPERATURE: f32 = 0.7;

/// Default request timeout in seconds.
pub const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 30;

/// Something that can answer a single user message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the assistant reply to `message`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError`] for any failure reaching or parsing the API.
    async fn complete(&self, message: &str) -> Result<String, ChatError>;
}

/// Connection settings for [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Full URL of the chat completions endpoint.
    pub endpoint: String,
    /// Model identifier sent in each request.
    pub model: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Name of the environment variable the key was read from.
    pub api_key_env: String,
    /// Bearer token, if one was found.
    pub api_key: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECS),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
        }
    }
}

impl ChatSettings {
    /// Reads the bearer token from `api_key_env`.
    ///
    /// An unset or blank variable leaves the key empty; the client reports
    /// it on the first call rather than at startup.
    #[must_use]
    pub fn with_key_from_env(mut self, api_key_env: impl Into<String>) -> Self {
        self.api_key_env = api_key_env.into();
        self.api_key = std::env::var(&self.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    /// Sets the bearer token directly.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat backend speaking the OpenAI-style chat completions protocol.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    settings: ChatSettings,
}

impl ChatClient {
    /// Builds the HTTP client once with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new(settings: ChatSettings) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent::default_chat_user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|source| ChatError::ClientBuild { source })?;
        debug!(
            endpoint = %settings.endpoint,
            model = %settings.model,
            has_key = settings.api_key.is_some(),
            "Chat client ready"
        );
        Ok(Self { client, settings })
    }

    /// Returns the settings in use.
    #[must_use]
    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    #[instrument(skip(self, message), fields(model = %self.settings.model))]
    async fn complete(&self, message: &str) -> Result<String, ChatError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::missing_api_key(&self.settings.api_key_env))?;

        let body = ChatRequest {
            model: &self.settings.model,
            messages: [RequestMessage {
                role: "user",
                content: message,
            }],
            temperature: CHAT_TEMPERATURE,
        };
        let timeout_secs = self.settings.timeout.as_secs();
        let endpoint = &self.settings.endpoint;

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::transport(endpoint, timeout_secs, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::transport(endpoint, timeout_secs, e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Chat API returned an error status");
            return Err(ChatError::http_status(status.as_u16(), &text));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ChatError::malformed(e.to_string()))?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::malformed("response has no choices"))?
            .message
            .content
            .ok_or_else(|| ChatError::malformed("first choice has no content"))?;

        debug!(chars = reply.len(), "Chat reply received");
        Ok(reply)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: [RequestMessage {
                role: "user",
                content: "hello",
            }],
            temperature: CHAT_TEMPERATURE,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        let temperature = value["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6, "temperature: {temperature}");
    }

    #[test]
    fn test_default_settings() {
        let settings = ChatSettings::default();
        assert_eq!(settings.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_with_key_from_unset_env_leaves_key_empty() {
        let settings =
            ChatSettings::default().with_key_from_env("CLIPFETCH_TEST_SURELY_UNSET_KEY_VAR");
        assert!(settings.api_key.is_none());
        assert_eq!(settings.api_key_env, "CLIPFETCH_TEST_SURELY_UNSET_KEY_VAR");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = ChatClient::new(ChatSettings {
            endpoint: "http://127.0.0.1:1/unreachable".to_string(),
            ..ChatSettings::default()
        })
        .unwrap();
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::MissingApiKey { .. }), "{err}");
    }
}
