//! Error type for resolver operations.

use std::path::Path;

use thiserror::Error;

/// Any failure of format discovery or download resolution.
///
/// The resolver never retries; a single failed attempt surfaces as this
/// error and the message text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResolutionError {
    /// Human-readable description of the failure.
    pub message: String,
}

impl ResolutionError {
    /// Creates an error carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The source URL was blank.
    #[must_use]
    pub fn empty_url() -> Self {
        Self::new("source URL is empty")
    }

    /// The resolver reported no format with the requested id.
    #[must_use]
    pub fn format_not_found(format_id: &str) -> Self {
        Self::new(format!("format '{format_id}' is not offered by this source"))
    }

    /// The requested format has no direct URL to hand off.
    #[must_use]
    pub fn no_direct_url(format_id: &str) -> Self {
        Self::new(format!(
            "format '{format_id}' has no direct download link\n  Suggestion: Pick another format or save the file instead"
        ))
    }

    /// The extraction tool could not be started at all.
    #[must_use]
    pub fn spawn_failed(program: &Path, reason: &std::io::Error) -> Self {
        Self::new(format!(
            "could not start '{}': {reason}\n  Suggestion: Install yt-dlp or set `ytdlp_path` in the config file",
            program.display()
        ))
    }

    /// The extraction tool ran and reported failure.
    #[must_use]
    pub fn tool_failed(stderr: &str, exit_code: Option<i32>) -> Self {
        let stderr = stderr.trim();
        if stderr.is_empty() {
            return match exit_code {
                Some(code) => Self::new(format!("extraction failed (exit code {code})")),
                None => Self::new("extraction was terminated before completing"),
            };
        }
        // Tools tend to print warnings before the actual error; the last line
        // is the one worth showing.
        let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or(stderr);
        Self::new(last_line.trim().to_string())
    }

    /// The extraction tool produced output that could not be understood.
    #[must_use]
    pub fn malformed_output(reason: impl std::fmt::Display) -> Self {
        Self::new(format!("unexpected resolver output: {reason}"))
    }
}
