//! Shared User-Agent string for outbound HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/clipfetch";

/// Default User-Agent for chat API requests.
#[must_use]
pub(crate) fn default_chat_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("clipfetch/{version} (chat-client; +{PROJECT_UA_URL})")
}
