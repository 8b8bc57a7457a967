//! Chat front-end: a transcript bound to a remote completion backend.
//!
//! [`ChatOrchestrator::send_message`] appends the user turn immediately and
//! runs the backend call through a [`TaskController`]. The reply (or the
//! failure text) is appended by [`ChatOrchestrator::apply`] on the
//! dispatcher when the [`ChatCompletion`] arrives.

mod client;
mod error;
mod transcript;

pub use client::{
    CHAT_TEMPERATURE, ChatBackend, ChatClient, ChatSettings, DEFAULT_API_KEY_ENV,
    DEFAULT_CHAT_ENDPOINT, DEFAULT_CHAT_MODEL, DEFAULT_CHAT_TIMEOUT_SECS,
};
pub use error::ChatError;
pub use transcript::{Role, Transcript, TranscriptEntry};

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::session::InputError;
use crate::task::{TaskController, TaskEvent, TaskPhase, TaskStatus};

/// Completion message for a chat call.
#[derive(Debug)]
pub struct ChatCompletion(pub Result<String, String>);

/// Chat session state plus its backend.
pub struct ChatOrchestrator {
    transcript: Transcript,
    controller: TaskController<ChatCompletion>,
    backend: Arc<dyn ChatBackend>,
}

impl ChatOrchestrator {
    /// Creates an orchestrator with an empty transcript.
    #[must_use]
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        completions: mpsc::UnboundedSender<ChatCompletion>,
    ) -> Self {
        Self {
            transcript: Transcript::new(),
            controller: TaskController::new(completions),
            backend,
        }
    }

    /// Returns the transcript so far.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the current task status.
    #[must_use]
    pub fn status(&self) -> &TaskStatus {
        self.controller.status()
    }

    /// Returns true while a reply is awaited.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    /// Subscribes to task status transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.controller.subscribe()
    }

    /// Appends `text` as a user turn and asks the backend for a reply.
    ///
    /// Returns `Ok(false)` without touching the transcript while a previous
    /// reply is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyMessage`] for blank text.
    pub fn send_message(&mut self, text: &str) -> Result<bool, InputError> {
        if text.trim().is_empty() {
            return Err(InputError::EmptyMessage);
        }
        if self.controller.is_busy() {
            debug!("Message sent while awaiting a reply; ignoring");
            return Ok(false);
        }

        self.transcript.push(Role::User, text);
        let backend = Arc::clone(&self.backend);
        let message = text.to_string();
        Ok(self.controller.run(
            TaskPhase::AwaitingReply,
            async move { backend.complete(&message).await },
            ChatCompletion,
        ))
    }

    /// Appends the reply or failure text and settles the task status.
    pub fn apply(&mut self, completion: ChatCompletion) -> &TranscriptEntry {
        self.controller.finish(&completion.0);
        match completion.0 {
            Ok(reply) => self.transcript.push(Role::Assistant, reply),
            Err(reason) => {
                warn!(error = %reason, "Chat call failed");
                self.transcript.push(Role::SystemError, reason)
            }
        }
    }
}
