//! Streaming archive download

use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::time::Instant;
use tap_errors::{Error, NetworkError};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::{parse_url, NetClient};

/// Result of a download operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub url: String,
    pub size: u64,
}

/// Capability to fetch a URL into a local file
///
/// The destination lives in a directory owned by the caller; implementations
/// only write the one file they are given.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` into `dest`, replacing anything already there
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] on transport failures or non-success HTTP
    /// status, and an I/O error if `dest` cannot be written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<DownloadResult, Error>;
}

/// [`Downloader`] over HTTP(S)
#[derive(Clone)]
pub struct HttpDownloader {
    client: NetClient,
}

impl HttpDownloader {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self { client }
    }

    async fn stream_to_file(
        response: reqwest::Response,
        url: &str,
        dest: &Path,
    ) -> Result<u64, Error> {
        let mut file = File::create(dest)
            .await
            .map_err(|e| NetworkError::archive_io(dest, &e))?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(format!("{url}: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| NetworkError::archive_io(dest, &e))?;
            downloaded += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| NetworkError::archive_io(dest, &e))?;
        file.sync_all()
            .await
            .map_err(|e| NetworkError::archive_io(dest, &e))?;
        Ok(downloaded)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<DownloadResult, Error> {
        let parsed = parse_url(url)?;
        let start = Instant::now();

        let response = self.client.get(parsed.as_str()).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        debug!(url, content_length = ?response.content_length(), "download started");

        let size = match Self::stream_to_file(response, url, dest).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                    debug!(path = %dest.display(), error = %remove_err, "could not remove partial download");
                }
                return Err(e);
            }
        };

        info!(
            url,
            bytes = size,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "download completed"
        );

        Ok(DownloadResult {
            url: url.to_string(),
            size,
        })
    }
}
