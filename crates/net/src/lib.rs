#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for tap
//!
//! This crate handles the one HTTP operation the installer needs: streaming a
//! release archive to disk. The [`Downloader`] trait is the seam the installer
//! depends on; [`HttpDownloader`] is the production implementation.

mod client;
mod download;

pub use client::{NetClient, NetConfig};
pub use download::{DownloadResult, Downloader, HttpDownloader};

use tap_errors::{Error, NetworkError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com").is_ok());
        assert!(parse_url("not a url").is_err());
    }
}
