//! Version parsing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VersionError {
    #[error("invalid version: {input:?}")]
    InvalidVersion { input: String },

    #[error("version {requested} is not published in the release table (table declares {available})")]
    NotPublished { requested: String, available: String },
}

impl UserFacingError for VersionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVersion { .. } => {
                Some("Use semantic-version strings like 1.2.3 (a leading `v` is accepted).")
            }
            Self::NotPublished { .. } => {
                Some("Stamp the release table for this version or pass a table that declares it.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidVersion { .. } => "version.invalid_version",
            Self::NotPublished { .. } => "version.not_published",
        };
        Some(code)
    }
}
