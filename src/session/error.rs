//! Error types for user input and session storage.

use std::path::PathBuf;

use thiserror::Error;

/// User input rejected before any external call is made.
///
/// These are non-fatal: the action is ignored and the session state is left
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The source URL is blank.
    #[error("Please enter a video URL")]
    EmptyUrl,

    /// The chat message is blank.
    #[error("message is empty")]
    EmptyMessage,

    /// Download requested without a selected format.
    #[error("no format selected\n  Suggestion: Fetch formats and pick one first")]
    NoFormatSelected,

    /// The chosen label or index does not match any available format.
    #[error("'{choice}' is not one of the available formats")]
    UnknownFormat {
        /// What the user asked for.
        choice: String,
    },
}

impl InputError {
    /// Creates an `UnknownFormat` error.
    #[must_use]
    pub fn unknown_format(choice: impl Into<String>) -> Self {
        Self::UnknownFormat {
            choice: choice.into(),
        }
    }
}

/// Failure preparing the destination folder.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The platform refused access to the destination folder.
    #[error(
        "permission denied for {path}\n  Suggestion: Grant storage access or choose another output folder"
    )]
    PermissionDenied {
        /// Folder that could not be created or written.
        path: PathBuf,
    },

    /// Any other filesystem failure.
    #[error("IO error preparing {path}: {source}")]
    Io {
        /// Folder that could not be prepared.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Classifies an IO error raised while preparing `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path }
        } else {
            Self::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_classified() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = StorageError::from_io("/locked", io);
        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.to_string().contains("/locked"));
    }

    #[test]
    fn test_other_io_errors_keep_source() {
        let io = std::io::Error::other("disk on fire");
        let err = StorageError::from_io("/out", io);
        assert!(matches!(err, StorageError::Io { .. }));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_unknown_format_names_choice() {
        let msg = InputError::unknown_format("999").to_string();
        assert!(msg.contains("999"), "{msg}");
    }
}
