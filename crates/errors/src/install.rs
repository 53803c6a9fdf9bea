//! Installation system error types

use std::borrow::Cow;

use crate::{FailureKind, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstallError {
    #[error("archive {archive} does not contain `{entry}`")]
    MissingPayload { entry: String, archive: String },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("self-check of {path} failed: {message}")]
    SelfCheckFailed { path: String, message: String },

    #[error("task execution failed: {message}")]
    TaskError { message: String },
}

impl InstallError {
    pub(crate) fn failure_kind(&self) -> FailureKind {
        match self {
            Self::SelfCheckFailed { .. } => FailureKind::SelfCheck,
            Self::TaskError { .. } => FailureKind::Internal,
            _ => FailureKind::Install,
        }
    }
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingPayload { .. } | Self::ExtractionFailed { .. } => {
                Some("The release archive layout is unexpected; check the release assets.")
            }
            Self::FilesystemError { .. } => {
                Some("Ensure the bin directory is writable and has free space, then retry.")
            }
            Self::SelfCheckFailed { .. } => {
                Some("The installed binary could not run `version`; it may not match this host.")
            }
            Self::TaskError { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::FilesystemError { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MissingPayload { .. } => "install.missing_payload",
            Self::ExtractionFailed { .. } => "install.extraction_failed",
            Self::FilesystemError { .. } => "install.io_error",
            Self::SelfCheckFailed { .. } => "install.self_check_failed",
            Self::TaskError { .. } => "install.task_error",
        };
        Some(code)
    }
}
