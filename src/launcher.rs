//! Hand-off of resolved direct links to the platform browser.

use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

/// Failure to open a URL with the platform handler.
#[derive(Debug, Error)]
#[error("could not open {url} in the browser: {source}\n  Suggestion: Copy the link and open it manually")]
pub struct LaunchError {
    /// URL that could not be opened.
    pub url: String,
    /// Underlying launch error.
    #[source]
    pub source: std::io::Error,
}

/// Something that can open a URL for the user.
pub trait Launcher: Send + Sync {
    /// Opens `url`.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when no handler could be started.
    fn open_url(&self, url: &str) -> Result<(), LaunchError>;
}

/// Opens URLs with the operating system's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        info!(url, "Opening direct link in browser");
        open::that_detached(url).map_err(|source| LaunchError {
            url: url.to_string(),
            source,
        })
    }
}

/// Launcher that records URLs instead of opening them.
///
/// Used when no browser should be started, e.g. in headless runs.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

impl RecordingLauncher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every URL passed to [`Launcher::open_url`] so far.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl Launcher for RecordingLauncher {
    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        info!(url, "Direct link ready (browser launch disabled)");
        if let Ok(mut urls) = self.opened.lock() {
            urls.push(url.to_string());
        }
        Ok(())
    }
}
