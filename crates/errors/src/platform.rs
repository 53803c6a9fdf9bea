//! Platform detection and process execution errors

use std::borrow::Cow;

use crate::{FailureKind, UserFacingError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum PlatformError {
    #[error("unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("invalid platform specifier: {input}")]
    InvalidPlatform { input: String },

    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },
}

impl PlatformError {
    pub(crate) fn failure_kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedPlatform { .. } | Self::InvalidPlatform { .. } => {
                FailureKind::Resolution
            }
            Self::ProcessExecutionFailed { .. } => FailureKind::Internal,
        }
    }
}

impl UserFacingError for PlatformError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedPlatform { .. } => {
                Some("Release archives are published for darwin and linux on arm64 and amd64 only.")
            }
            Self::InvalidPlatform { .. } => {
                Some("Use an `<os>-<arch>` specifier such as `linux-amd64` or `darwin-arm64`.")
            }
            Self::ProcessExecutionFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnsupportedPlatform { .. } => "platform.unsupported",
            Self::InvalidPlatform { .. } => "platform.invalid",
            Self::ProcessExecutionFailed { .. } => "platform.process_failed",
        };
        Some(code)
    }
}
