//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status} fetching {url}")]
    HttpError { status: u16, url: String },

    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },

    /// The archive could not be stored or read back on local disk
    #[error("cannot store downloaded archive at {path}: {message}")]
    ArchiveIo { path: String, message: String },
}

impl NetworkError {
    /// Local I/O failure on the downloaded archive at `path`
    #[must_use]
    pub fn archive_io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::ArchiveIo {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("Check your network connection or raise the network timeout.")
            }
            Self::HttpError { status: 404, .. } => {
                Some("The release archive does not exist; check the version and the release table.")
            }
            Self::RateLimited { .. } => Some("Wait for the rate limit to reset and retry."),
            Self::ArchiveIo { .. } => {
                Some("Check free space and permissions of the temp directory (TAP_TEMP_DIR).")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::ConnectionRefused(_)
            | Self::DownloadFailed(_)
            | Self::RateLimited { .. } => true,
            Self::HttpError { status, .. } => *status >= 500,
            Self::InvalidUrl(_) | Self::ArchiveIo { .. } => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Timeout { .. } => "network.timeout",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::HttpError { .. } => "network.http_error",
            Self::RateLimited { .. } => "network.rate_limited",
            Self::ArchiveIo { .. } => "network.archive_io",
        };
        Some(code)
    }
}
