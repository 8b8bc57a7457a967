//! Terminal presenter: renders session state, task events and chat turns.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use clipfetch_core::{
    DownloadTarget, Launcher, Role, Session, TaskEvent, TaskPhase, TaskStatus, TranscriptEntry,
    WorkflowUpdate,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use tracing::warn;

use crate::app::terminal::Presentation;

pub(crate) struct View {
    use_spinner: bool,
    spinner: Option<ProgressBar>,
    launcher: Option<Arc<dyn Launcher>>,
}

impl View {
    pub(crate) fn new(presentation: Presentation) -> Self {
        Self {
            use_spinner: presentation.spinner,
            spinner: None,
            launcher: None,
        }
    }

    /// Hands resolved direct links to `launcher`.
    pub(crate) fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Applies every task event already queued on `events`.
    ///
    /// The dispatcher calls this right after applying a completion so the
    /// spinner is gone before results are printed.
    pub(crate) fn drain_events(&mut self, events: &mut broadcast::Receiver<TaskEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.on_task_event(&event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "View fell behind task events");
                }
                Err(_) => break,
            }
        }
    }

    pub(crate) fn on_task_event(&mut self, event: &TaskEvent) {
        match event {
            TaskEvent::Started(phase) => self.start_spinner(*phase),
            TaskEvent::Finished { .. } => self.stop_spinner(),
        }
    }

    fn start_spinner(&mut self, phase: TaskPhase) {
        self.stop_spinner();
        if !self.use_spinner {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(phase_message(phase));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    pub(crate) fn show_update(&self, update: &WorkflowUpdate, session: &Session) {
        match update {
            WorkflowUpdate::FormatsReady { count: 0 } => {
                println!("No formats matched the current filter.");
            }
            WorkflowUpdate::FormatsReady { .. } => self.show_options(session),
            WorkflowUpdate::DownloadReady(DownloadTarget::DirectLink { url }) => {
                println!("Direct link: {url}");
                if let Some(launcher) = &self.launcher
                    && let Err(err) = launcher.open_url(url)
                {
                    self.show_error(err);
                }
            }
            WorkflowUpdate::DownloadReady(DownloadTarget::Materialized { title, path }) => {
                println!("Saved \"{title}\" to {}", path.display());
            }
            WorkflowUpdate::Failed { phase, reason } => {
                self.show_error(format!("{} failed: {reason}", phase_title(*phase)));
            }
        }
    }

    pub(crate) fn show_options(&self, session: &Session) {
        let lines = option_lines(session);
        if lines.is_empty() {
            println!("No formats yet. Enter a video URL to fetch them.");
            return;
        }
        for line in lines {
            println!("{line}");
        }
    }

    pub(crate) fn show_status(&self, status: &TaskStatus, session: &Session) {
        println!("{}", status_line(status));
        let url = session.source_url();
        if !url.trim().is_empty() {
            println!("URL: {url}");
        }
        if let Some(option) = session.selected_option() {
            println!("Selected: {}", option.display_label());
        }
    }

    pub(crate) fn show_entry(&self, entry: &TranscriptEntry) {
        println!("{}", entry_line(entry));
    }

    pub(crate) fn show_notice(&self, message: impl Display) {
        println!("{message}");
    }

    pub(crate) fn show_error(&self, message: impl Display) {
        eprintln!("Error: {message}");
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

fn phase_message(phase: TaskPhase) -> &'static str {
    match phase {
        TaskPhase::Discovering => "Fetching formats...",
        TaskPhase::Downloading => "Downloading...",
        TaskPhase::AwaitingReply => "Waiting for reply...",
    }
}

fn phase_title(phase: TaskPhase) -> &'static str {
    match phase {
        TaskPhase::Discovering => "Fetching formats",
        TaskPhase::Downloading => "Download",
        TaskPhase::AwaitingReply => "Chat request",
    }
}

/// Numbered option list with the current selection marked.
pub(crate) fn option_lines(session: &Session) -> Vec<String> {
    let selected = session.selected_option();
    session
        .available_options()
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let marker = if Some(option) == selected { '*' } else { ' ' };
            format!("{marker} {:>2}) {}", index + 1, option.display_label())
        })
        .collect()
}

pub(crate) fn status_line(status: &TaskStatus) -> String {
    match status {
        TaskStatus::Idle => "Status: idle".to_string(),
        TaskStatus::Discovering => "Status: fetching formats".to_string(),
        TaskStatus::Downloading => "Status: downloading".to_string(),
        TaskStatus::AwaitingReply => "Status: waiting for reply".to_string(),
        TaskStatus::Succeeded => "Status: done".to_string(),
        TaskStatus::Failed(reason) => format!("Status: failed ({reason})"),
    }
}

pub(crate) fn entry_line(entry: &TranscriptEntry) -> String {
    match entry.role {
        Role::User => format!("you> {}", entry.content),
        Role::Assistant => format!("assistant> {}", entry.content),
        Role::SystemError => format!("[error] {}", entry.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipfetch_core::FormatOption;

    #[test]
    fn test_option_lines_mark_selection() {
        let mut session = Session::new("/out");
        session.replace_options(vec![
            FormatOption::new("18", "360p", "mp4"),
            FormatOption::new("22", "720p", "mp4"),
        ]);
        session.select_index(1).unwrap();

        let lines = option_lines(&session);
        assert_eq!(lines, vec!["   1) 18 - 360p - mp4", "*  2) 22 - 720p - mp4"]);
    }

    #[test]
    fn test_spinner_suppressed_for_plain_output() {
        let mut view = View::new(Presentation {
            color: false,
            spinner: false,
        });
        view.on_task_event(&TaskEvent::Started(TaskPhase::Discovering));
        assert!(view.spinner.is_none());
        view.on_task_event(&TaskEvent::Finished {
            phase: TaskPhase::Discovering,
            status: TaskStatus::Succeeded,
        });
        assert!(view.spinner.is_none());
    }

    #[test]
    fn test_option_lines_empty_session() {
        assert!(option_lines(&Session::new("/out")).is_empty());
    }

    #[test]
    fn test_status_line_includes_failure_reason() {
        assert_eq!(
            status_line(&TaskStatus::Failed("offline".to_string())),
            "Status: failed (offline)"
        );
        assert_eq!(status_line(&TaskStatus::Idle), "Status: idle");
    }

    #[test]
    fn test_entry_line_prefixes_by_role() {
        assert_eq!(
            entry_line(&TranscriptEntry::new(Role::User, "hello")),
            "you> hello"
        );
        assert_eq!(
            entry_line(&TranscriptEntry::new(Role::Assistant, "hi")),
            "assistant> hi"
        );
        assert_eq!(
            entry_line(&TranscriptEntry::new(Role::SystemError, "timed out")),
            "[error] timed out"
        );
    }
}
