//! Checksum verification errors
//!
//! A mismatch is a security-relevant condition and is never retryable.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegrityError {
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    Mismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("malformed sha256 digest: {value:?}")]
    MalformedDigest { value: String },
}

impl UserFacingError for IntegrityError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Mismatch { .. } => Some(
                "The downloaded archive does not match the published checksum. Do not install it; report the release.",
            ),
            Self::MalformedDigest { .. } => {
                Some("Digests must be 64 hexadecimal characters (SHA-256).")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Mismatch { .. } => "integrity.mismatch",
            Self::MalformedDigest { .. } => "integrity.malformed_digest",
        };
        Some(code)
    }
}
