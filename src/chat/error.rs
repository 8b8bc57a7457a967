//! Error types for the chat client.

use thiserror::Error;

/// Errors that can occur during a chat completion call.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API token was found in the environment at startup.
    #[error("no API key configured\n  Suggestion: Set the {env_var} environment variable and restart")]
    MissingApiKey {
        /// Environment variable that was consulted.
        env_var: String,
    },

    /// Network-level error (DNS, connection refused, TLS, etc.)
    #[error("network error contacting {endpoint}: {source}")]
    Network {
        /// Endpoint that could not be reached.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout in whole seconds.
        timeout_secs: u64,
    },

    /// The API answered with a non-2xx status.
    #[error("chat API returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed chat API response: {reason}")]
    MalformedResponse {
        /// What was wrong with the body.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("chat client construction failed: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

/// Longest response body kept in [`ChatError::HttpStatus`].
const MAX_ERROR_BODY_CHARS: usize = 200;

impl ChatError {
    /// Creates a `MissingApiKey` error naming `env_var`.
    pub fn missing_api_key(env_var: impl Into<String>) -> Self {
        Self::MissingApiKey {
            env_var: env_var.into(),
        }
    }

    /// Classifies a reqwest transport error.
    pub fn transport(endpoint: impl Into<String>, timeout_secs: u64, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Network {
                endpoint: endpoint.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error, truncating long bodies.
    pub fn http_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let body = if body.chars().count() > MAX_ERROR_BODY_CHARS {
            let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            format!("{truncated}...")
        } else {
            body.to_string()
        };
        Self::HttpStatus { status, body }
    }

    /// Creates a malformed-response error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}
