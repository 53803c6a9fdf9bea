//! CLI error handling

use std::fmt;

use tap_errors::{FailureKind, UserFacingError};

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(tap_errors::ConfigError),
    /// Install pipeline error
    Ops(tap_errors::Error),
    /// I/O error writing output
    Io(std::io::Error),
}

impl CliError {
    /// Failure category reported to the caller
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            CliError::Config(_) => FailureKind::Config,
            CliError::Ops(e) => e.failure_kind(),
            CliError::Io(_) => FailureKind::Internal,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.failure_kind().exit_code()
    }

    pub fn user_code(&self) -> Option<&'static str> {
        match self {
            CliError::Config(e) => e.user_code(),
            CliError::Ops(e) => e.user_code(),
            CliError::Io(_) => Some("error.io"),
        }
    }

    pub fn user_hint(&self) -> Option<&'static str> {
        match self {
            CliError::Config(e) => e.user_hint(),
            CliError::Ops(e) => e.user_hint(),
            _ => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e.user_message()),
            CliError::Ops(e) => write!(f, "{}", e.user_message()),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<tap_errors::ConfigError> for CliError {
    fn from(e: tap_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<tap_errors::Error> for CliError {
    fn from(e: tap_errors::Error) -> Self {
        match e {
            tap_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Ops(other),
        }
    }
}

impl From<tap_errors::PlatformError> for CliError {
    fn from(e: tap_errors::PlatformError) -> Self {
        CliError::Ops(e.into())
    }
}

impl From<tap_errors::VersionError> for CliError {
    fn from(e: tap_errors::VersionError) -> Self {
        CliError::Ops(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
