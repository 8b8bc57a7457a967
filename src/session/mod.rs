//! Per-launch session state.
//!
//! A [`Session`] is created once per process and passed explicitly to the
//! workflow that owns it; there is no process-wide singleton. It holds the
//! source URL typed by the user, the options from the latest discovery, the
//! current selection, and the destination folder for materialized downloads.

mod error;

pub use error::{InputError, StorageError};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::format::{FormatOption, parse_format_id};

/// Session state for the downloader front-ends.
///
/// Invariant: the selection, when present, always points at an entry of
/// `available_options`.
#[derive(Debug)]
pub struct Session {
    source_url: String,
    available_options: Vec<FormatOption>,
    selected: Option<usize>,
    destination_dir: PathBuf,
    destination_ready: bool,
}

impl Session {
    /// Creates an empty session writing materialized downloads to `destination_dir`.
    #[must_use]
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_url: String::new(),
            available_options: Vec::new(),
            selected: None,
            destination_dir: destination_dir.into(),
            destination_ready: false,
        }
    }

    /// Returns the URL exactly as the user entered it.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Stores the URL the user entered.
    pub fn set_source_url(&mut self, url: impl Into<String>) {
        self.source_url = url.into();
    }

    /// Returns the trimmed source URL.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyUrl`] when the URL is blank.
    pub fn require_url(&self) -> Result<&str, InputError> {
        let url = self.source_url.trim();
        if url.is_empty() {
            return Err(InputError::EmptyUrl);
        }
        Ok(url)
    }

    /// Returns the options from the latest successful discovery.
    #[must_use]
    pub fn available_options(&self) -> &[FormatOption] {
        &self.available_options
    }

    /// Returns the selected option, if any.
    #[must_use]
    pub fn selected_option(&self) -> Option<&FormatOption> {
        self.selected.and_then(|index| self.available_options.get(index))
    }

    /// Replaces the available options with `options`.
    ///
    /// The previous selection survives only if an identical option is still
    /// offered; otherwise the first option (if any) becomes selected.
    pub fn replace_options(&mut self, options: Vec<FormatOption>) {
        let previous = self.selected_option().cloned();
        self.available_options = options;
        self.selected = previous
            .and_then(|prev| self.available_options.iter().position(|o| *o == prev))
            .or_else(|| (!self.available_options.is_empty()).then_some(0));
        debug!(
            option_count = self.available_options.len(),
            selected = ?self.selected,
            "Replaced available options"
        );
    }

    /// Selects the option matching a display label or bare format id.
    ///
    /// An exact label match wins; otherwise the id is parsed out of `choice`,
    /// which keeps ids ending in `" -"` selectable by their label.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownFormat`] when no option matches; the
    /// current selection is left unchanged.
    pub fn select(&mut self, choice: &str) -> Result<&FormatOption, InputError> {
        let choice = choice.trim();
        let by_label = self
            .available_options
            .iter()
            .position(|option| option.display_label() == choice);
        let index = match by_label {
            Some(index) => index,
            None => {
                let id = parse_format_id(choice);
                self.available_options
                    .iter()
                    .position(|option| option.id == id)
                    .ok_or_else(|| InputError::unknown_format(choice))?
            }
        };
        self.selected = Some(index);
        Ok(&self.available_options[index])
    }

    /// Selects the option at zero-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownFormat`] when `index` is out of range.
    pub fn select_index(&mut self, index: usize) -> Result<&FormatOption, InputError> {
        if index >= self.available_options.len() {
            return Err(InputError::unknown_format(format!("#{}", index + 1)));
        }
        self.selected = Some(index);
        Ok(&self.available_options[index])
    }

    /// Returns the destination folder for materialized downloads.
    #[must_use]
    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    /// Creates the destination folder if absent. Runs at most once per session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the folder cannot be created; permission
    /// failures map to [`StorageError::PermissionDenied`].
    pub fn ensure_destination_dir(&mut self) -> Result<&Path, StorageError> {
        if !self.destination_ready {
            fs::create_dir_all(&self.destination_dir)
                .map_err(|source| StorageError::from_io(&self.destination_dir, source))?;
            self.destination_ready = true;
            info!(dir = %self.destination_dir.display(), "Destination folder ready");
        }
        Ok(&self.destination_dir)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(ids: &[&str]) -> Vec<FormatOption> {
        ids.iter()
            .map(|id| FormatOption::new(*id, "note", "mp4"))
            .collect()
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new("/out");
        assert_eq!(session.source_url(), "");
        assert!(session.available_options().is_empty());
        assert!(session.selected_option().is_none());
        assert_eq!(session.destination_dir(), Path::new("/out"));
    }

    #[test]
    fn test_require_url_trims_and_rejects_blank() {
        let mut session = Session::new("/out");
        assert_eq!(session.require_url(), Err(InputError::EmptyUrl));
        session.set_source_url("   \t");
        assert_eq!(session.require_url(), Err(InputError::EmptyUrl));
        session.set_source_url("  https://example.com/v  ");
        assert_eq!(session.require_url().unwrap(), "https://example.com/v");
        assert_eq!(session.source_url(), "  https://example.com/v  ");
    }

    #[test]
    fn test_replace_options_preselects_first() {
        let mut session = Session::new("/out");
        session.replace_options(options(&["18", "22"]));
        assert_eq!(session.selected_option().unwrap().id, "18");
    }

    #[test]
    fn test_replace_options_keeps_selection_still_offered() {
        let mut session = Session::new("/out");
        session.replace_options(options(&["18", "22", "137"]));
        session.select("22").unwrap();

        session.replace_options(options(&["137", "22"]));
        assert_eq!(session.selected_option().unwrap().id, "22");
    }

    #[test]
    fn test_replace_options_drops_selection_no_longer_offered() {
        let mut session = Session::new("/out");
        session.replace_options(options(&["18", "22"]));
        session.select("22").unwrap();

        session.replace_options(options(&["137", "140"]));
        assert_eq!(session.selected_option().unwrap().id, "137");

        session.replace_options(Vec::new());
        assert!(session.selected_option().is_none());
    }

    #[test]
    fn test_replace_options_requires_identical_option() {
        let mut session = Session::new("/out");
        session.replace_options(vec![FormatOption::new("22", "720p", "mp4")]);
        session.replace_options(vec![
            FormatOption::new("18", "360p", "mp4"),
            FormatOption::new("22", "720p", "webm"),
        ]);
        // Same id but different extension is a different option.
        assert_eq!(session.selected_option().unwrap().id, "18");
    }

    #[test]
    fn test_select_by_label_or_id() {
        let mut session = Session::new("/out");
        session.replace_options(options(&["18", "22"]));

        let chosen = session.select("22 - note - mp4").unwrap().clone();
        assert_eq!(chosen.id, "22");
        assert_eq!(session.select(" 18 ").unwrap().id, "18");
    }

    #[test]
    fn test_select_unknown_keeps_previous_selection() {
        let mut session = Session::new("/out");
        session.replace_options(options(&["18", "22"]));
        session.select("22").unwrap();

        let err = session.select("999 - x - mp4").unwrap_err();
        assert_eq!(err, InputError::unknown_format("999 - x - mp4"));
        assert_eq!(session.selected_option().unwrap().id, "22");
    }

    #[test]
    fn test_select_index_bounds() {
        let mut session = Session::new("/out");
        session.replace_options(options(&["18", "22"]));
        assert_eq!(session.select_index(1).unwrap().id, "22");
        assert!(session.select_index(2).is_err());
        assert_eq!(session.selected_option().unwrap().id, "22");
    }

    #[test]
    fn test_ensure_destination_dir_creates_once() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("out");
        let mut session = Session::new(&dir);

        assert_eq!(session.ensure_destination_dir().unwrap(), dir.as_path());
        assert!(dir.is_dir());

        // Second call is a no-op even if the folder already exists.
        assert!(session.ensure_destination_dir().is_ok());
    }

    #[test]
    fn test_ensure_destination_dir_reports_io_failure() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let mut session = Session::new(blocker.join("out"));

        assert!(session.ensure_destination_dir().is_err());
    }
}
