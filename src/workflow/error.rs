//! Error type for workflow commands.

use thiserror::Error;

use crate::session::{InputError, StorageError};

/// A workflow command rejected before any external call was made.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The user input was not acceptable.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The destination folder could not be prepared.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WorkflowError {
    /// Returns true when the failure ends the flow because storage access was denied.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Storage(StorageError::PermissionDenied { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_is_transparent() {
        let err = WorkflowError::from(InputError::EmptyUrl);
        assert_eq!(err.to_string(), InputError::EmptyUrl.to_string());
        assert!(!err.is_permission_denied());
    }

    #[test]
    fn test_permission_denied_detection() {
        let err = WorkflowError::from(StorageError::PermissionDenied {
            path: "/locked".into(),
        });
        assert!(err.is_permission_denied());
    }
}
