//! Downloader front-end logic: discover formats, pick one, download.
//!
//! [`FormatWorkflow`] owns the [`Session`] and its [`TaskController`] and
//! turns user commands into resolver calls. Results come back as
//! [`FormatCompletion`] messages on the dispatcher's channel and are applied
//! with [`FormatWorkflow::apply`], which is the only place session state
//! changes as a consequence of an external call.

mod error;

pub use error::WorkflowError;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::format::{FormatEntry, FormatFilter};
use crate::resolver::{DownloadTarget, Resolver, TargetRequest};
use crate::session::{InputError, Session};
use crate::task::{TaskController, TaskEvent, TaskPhase, TaskStatus};

/// How a chosen format reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Resolve a direct link and hand it to the platform browser.
    #[default]
    DirectLink,
    /// Let the resolver write the file into the session's destination folder.
    Materialize,
}

/// Completion message produced by a workflow operation.
#[derive(Debug)]
pub enum FormatCompletion {
    /// Format discovery finished.
    Discovered(Result<Vec<FormatEntry>, String>),
    /// Download resolution finished.
    Resolved(Result<DownloadTarget, String>),
}

/// What changed after a completion was applied, for the view to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowUpdate {
    /// New options are available (possibly none after filtering).
    FormatsReady {
        /// Number of options offered to the user.
        count: usize,
    },
    /// The chosen format was resolved.
    DownloadReady(DownloadTarget),
    /// The operation failed; session state is unchanged.
    Failed {
        /// Operation that failed.
        phase: TaskPhase,
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Downloader workflow bound to one session.
pub struct FormatWorkflow {
    session: Session,
    controller: TaskController<FormatCompletion>,
    resolver: Arc<dyn Resolver>,
    filter: FormatFilter,
    delivery: DeliveryMode,
}

impl FormatWorkflow {
    /// Creates a workflow delivering completions to `completions`.
    #[must_use]
    pub fn new(
        session: Session,
        resolver: Arc<dyn Resolver>,
        filter: FormatFilter,
        delivery: DeliveryMode,
        completions: mpsc::UnboundedSender<FormatCompletion>,
    ) -> Self {
        debug!(
            resolver = resolver.name(),
            filter = filter.name(),
            delivery = ?delivery,
            "Format workflow created"
        );
        Self {
            session,
            controller: TaskController::new(completions),
            resolver,
            filter,
            delivery,
        }
    }

    /// Returns the session state.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the current task status.
    #[must_use]
    pub fn status(&self) -> &TaskStatus {
        self.controller.status()
    }

    /// Returns true while discovery or download is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    /// Returns the delivery mode.
    #[must_use]
    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    /// Subscribes to task status transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.controller.subscribe()
    }

    /// Stores the URL typed by the user.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.session.set_source_url(url);
    }

    /// Selects an option by display label or bare id.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownFormat`] when nothing matches.
    pub fn select(&mut self, choice: &str) -> Result<(), InputError> {
        self.session.select(choice).map(|_| ())
    }

    /// Selects the option at zero-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownFormat`] when out of range.
    pub fn select_index(&mut self, index: usize) -> Result<(), InputError> {
        self.session.select_index(index).map(|_| ())
    }

    /// Starts format discovery for the session URL.
    ///
    /// Returns `Ok(false)` when another operation is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyUrl`] when the URL is blank; nothing runs.
    pub fn fetch_formats(&mut self) -> Result<bool, InputError> {
        let url = self.session.require_url()?.to_string();
        let resolver = Arc::clone(&self.resolver);
        Ok(self.controller.run(
            TaskPhase::Discovering,
            async move { resolver.discover_formats(&url).await },
            FormatCompletion::Discovered,
        ))
    }

    /// Starts resolving the selected format according to the delivery mode.
    ///
    /// In materializing mode the destination folder is created first (once
    /// per session). Returns `Ok(false)` when another operation is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Input`] for a blank URL or missing selection
    /// and [`WorkflowError::Storage`] when the destination folder cannot be
    /// prepared. Nothing runs in either case.
    pub fn download(&mut self) -> Result<bool, WorkflowError> {
        let url = self.session.require_url()?.to_string();
        let format_id = self
            .session
            .selected_option()
            .map(|option| option.id.clone())
            .ok_or(InputError::NoFormatSelected)?;
        if self.controller.is_busy() {
            debug!("Download requested while busy; ignoring");
            return Ok(false);
        }

        let request = match self.delivery {
            DeliveryMode::DirectLink => TargetRequest::DirectLink,
            DeliveryMode::Materialize => TargetRequest::Materialize {
                destination_dir: self.session.ensure_destination_dir()?.to_path_buf(),
            },
        };

        let resolver = Arc::clone(&self.resolver);
        Ok(self.controller.run(
            TaskPhase::Downloading,
            async move {
                resolver
                    .resolve_download_target(&url, &format_id, &request)
                    .await
            },
            FormatCompletion::Resolved,
        ))
    }

    /// Applies a completion to the session and settles the task status.
    ///
    /// Session state is updated before observers are notified, so anything
    /// re-rendering on the `Finished` event sees the new state.
    pub fn apply(&mut self, completion: FormatCompletion) -> WorkflowUpdate {
        match completion {
            FormatCompletion::Discovered(Ok(entries)) => {
                let options = self.filter.apply(&entries);
                let count = options.len();
                info!(
                    discovered = entries.len(),
                    offered = count,
                    filter = self.filter.name(),
                    "Formats ready"
                );
                self.session.replace_options(options);
                self.controller.finish(&Ok::<(), String>(()));
                WorkflowUpdate::FormatsReady { count }
            }
            FormatCompletion::Resolved(Ok(target)) => {
                self.controller.finish(&Ok::<(), String>(()));
                WorkflowUpdate::DownloadReady(target)
            }
            FormatCompletion::Discovered(Err(reason)) => {
                self.fail(TaskPhase::Discovering, reason)
            }
            FormatCompletion::Resolved(Err(reason)) => self.fail(TaskPhase::Downloading, reason),
        }
    }

    fn fail(&mut self, phase: TaskPhase, reason: String) -> WorkflowUpdate {
        warn!(phase = %phase, error = %reason, "Operation failed");
        self.controller.finish(&Err::<(), String>(reason.clone()));
        WorkflowUpdate::Failed { phase, reason }
    }
}
