#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! SHA-256 integrity checks for tap
//!
//! Release archives are published with SHA-256 digests. This crate provides
//! the digest type, streaming computation over files and readers, and the
//! equality check that gates installation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tap_errors::{Error, IntegrityError};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Length of a hex-encoded SHA-256 digest
pub const HEX_LEN: usize = 64;

/// A SHA-256 digest value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Digest {
    bytes: [u8; 32],
}

impl Sha256Digest {
    /// Create a digest from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Convert to lowercase hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from hex string. Upper and lower case are both accepted.
    ///
    /// # Errors
    /// Returns an error if the input is not exactly 64 hexadecimal characters.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let malformed = || IntegrityError::MalformedDigest {
            value: s.to_string(),
        };

        if s.len() != HEX_LEN {
            return Err(malformed().into());
        }

        let mut array = [0u8; 32];
        hex::decode_to_slice(s, &mut array).map_err(|_| malformed())?;
        Ok(Self::from_bytes(array))
    }

    /// Compute digest of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_bytes(Sha256::digest(data).into())
    }

    /// Compute digest of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self::from_bytes(hasher.finalize().into()))
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Sha256Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Verify a file matches an expected digest
///
/// Returns the digest that was computed so callers can report it.
///
/// # Errors
/// Returns an error if the file cannot be read, or
/// [`IntegrityError::Mismatch`] if the digests differ.
pub async fn verify_file(
    path: &Path,
    expected: &Sha256Digest,
    url: &str,
) -> Result<Sha256Digest, Error> {
    let actual = Sha256Digest::hash_file(path).await?;
    ensure_matches(&actual, expected, url)?;
    Ok(actual)
}

/// Compare a computed digest against the published one
///
/// # Errors
/// Returns [`IntegrityError::Mismatch`] if the digests differ.
pub fn ensure_matches(
    actual: &Sha256Digest,
    expected: &Sha256Digest,
    url: &str,
) -> Result<(), Error> {
    if actual == expected {
        Ok(())
    } else {
        Err(IntegrityError::Mismatch {
            url: url.to_string(),
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        }
        .into())
    }
}
