//! Release installer state machine
//!
//! One run moves linearly through
//! `Start -> Resolved -> FetchedVerified -> Installed -> Checked`.
//! Any error ends the run in the stage it occurred in; there is no
//! recovery path and nothing is retried here.

use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tap_errors::{Error, NetworkError};
use tap_hash::Sha256Digest;
use tap_net::Downloader;
use tap_platform::ProcessOperations;
use tap_types::{DescriptorTable, InstallReport, PlatformKey, ReleaseDescriptor};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::archive::extract_payload;
use crate::file_installer::{FileInstaller, InstalledArtifact};
use crate::self_check::run_self_check;

/// Position of a run in the install pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Start,
    Resolved,
    FetchedVerified,
    Installed,
    Checked,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstallStage::Start => "start",
            InstallStage::Resolved => "resolved",
            InstallStage::FetchedVerified => "fetched-verified",
            InstallStage::Installed => "installed",
            InstallStage::Checked => "checked",
        })
    }
}

/// Archive on disk whose digest matched the descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArchive {
    pub path: PathBuf,
    pub size: u64,
    pub digest: Sha256Digest,
}

/// Parameters of one install run
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub platform: PlatformKey,
    /// Requested version, as typed by the user
    pub version: String,
    /// Directory the executable is placed in
    pub bin_dir: PathBuf,
    /// Parent for the scratch directory; the system temp dir when `None`
    pub work_dir: Option<PathBuf>,
}

/// Drives resolve, fetch, install and self-check for one descriptor table
pub struct ReleaseInstaller {
    table: DescriptorTable,
    downloader: Box<dyn Downloader>,
    file_installer: Box<dyn FileInstaller>,
    process: Box<dyn ProcessOperations>,
}

impl fmt::Debug for ReleaseInstaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseInstaller")
            .field("name", &self.table.name)
            .field("version", &self.table.version)
            .finish_non_exhaustive()
    }
}

impl ReleaseInstaller {
    #[must_use]
    pub fn new(
        table: DescriptorTable,
        downloader: Box<dyn Downloader>,
        file_installer: Box<dyn FileInstaller>,
        process: Box<dyn ProcessOperations>,
    ) -> Self {
        Self {
            table,
            downloader,
            file_installer,
            process,
        }
    }

    /// Look up the descriptor for `platform` and `version`
    ///
    /// # Errors
    ///
    /// See [`DescriptorTable::resolve`].
    pub fn resolve(
        &self,
        platform: PlatformKey,
        version: &str,
    ) -> Result<ReleaseDescriptor, Error> {
        self.table.resolve(platform, version)
    }

    /// Download the descriptor's archive into `work_dir` and verify it
    ///
    /// The archive is deleted again if its digest does not match.
    ///
    /// # Errors
    ///
    /// Returns a network error if the download fails or the archive cannot be
    /// stored, and [`tap_errors::IntegrityError::Mismatch`] if the digest
    /// differs.
    pub async fn fetch_and_verify(
        &self,
        descriptor: &ReleaseDescriptor,
        work_dir: &Path,
    ) -> Result<VerifiedArchive, Error> {
        let path = work_dir.join(descriptor.archive_name());
        debug!(url = %descriptor.url, dest = %path.display(), "fetching archive");

        let download = self.downloader.fetch(&descriptor.url, &path).await?;

        match tap_hash::verify_file(&path, &descriptor.checksum, &descriptor.url).await {
            Ok(digest) => Ok(VerifiedArchive {
                path,
                size: download.size,
                digest,
            }),
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    debug!(path = %path.display(), error = %remove_err, "could not remove rejected archive");
                }
                // Reading the archive back is still part of the fetch stage.
                Err(match e {
                    Error::Io { message, .. } => NetworkError::ArchiveIo {
                        path: path.display().to_string(),
                        message,
                    }
                    .into(),
                    other => other,
                })
            }
        }
    }

    /// Extract the executable from `archive` and place it in `bin_dir`
    ///
    /// # Errors
    ///
    /// Returns [`tap_errors::InstallError::MissingPayload`] if the archive lacks the
    /// executable, or a filesystem error if it cannot be written.
    pub async fn install(
        &self,
        archive: &VerifiedArchive,
        bin_dir: &Path,
    ) -> Result<InstalledArtifact, Error> {
        let payload = extract_payload(&archive.path, &self.table.binary).await?;
        self.file_installer
            .install_executable(&payload, bin_dir)
            .await
    }

    /// Run the installed executable's smoke test
    ///
    /// # Errors
    ///
    /// Returns [`tap_errors::InstallError::SelfCheckFailed`] unless it exits 0.
    pub async fn self_check(&self, artifact: &Path) -> Result<(), Error> {
        run_self_check(self.process.as_ref(), artifact).await
    }

    /// Run every stage in order
    ///
    /// # Errors
    ///
    /// Returns the first stage error; later stages are not attempted.
    pub async fn run(&self, request: &InstallRequest) -> Result<InstallReport, Error> {
        let started = Instant::now();
        let mut stage = InstallStage::Start;

        let result = self.run_stages(request, &mut stage).await;
        match result {
            Ok((descriptor, archive, artifact)) => {
                let duration_ms =
                    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                info!(
                    name = %self.table.name,
                    version = %descriptor.version,
                    path = %artifact.path.display(),
                    duration_ms,
                    "install complete"
                );
                Ok(InstallReport {
                    name: self.table.name.clone(),
                    version: descriptor.version,
                    platform: descriptor.platform,
                    url: descriptor.url,
                    checksum: archive.digest,
                    artifact: artifact.path,
                    bytes_downloaded: archive.size,
                    duration_ms,
                    completed_at: Utc::now(),
                })
            }
            Err(e) => {
                warn!(%stage, kind = %e.failure_kind(), error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &InstallRequest,
        stage: &mut InstallStage,
    ) -> Result<(ReleaseDescriptor, VerifiedArchive, InstalledArtifact), Error> {
        let descriptor = self.resolve(request.platform, &request.version)?;
        advance(stage, InstallStage::Resolved);

        let scratch = scratch_dir(request.work_dir.as_deref())?;
        let archive = self.fetch_and_verify(&descriptor, scratch.path()).await?;
        advance(stage, InstallStage::FetchedVerified);

        let artifact = self.install(&archive, &request.bin_dir).await?;
        advance(stage, InstallStage::Installed);

        self.self_check(&artifact.path).await?;
        advance(stage, InstallStage::Checked);

        Ok((descriptor, archive, artifact))
    }
}

fn advance(stage: &mut InstallStage, next: InstallStage) {
    debug!(from = %stage, to = %next, "stage transition");
    *stage = next;
}

/// Scratch directory the archive is downloaded into
fn scratch_dir(parent: Option<&Path>) -> Result<TempDir, Error> {
    let parent = parent.map_or_else(std::env::temp_dir, Path::to_path_buf);
    std::fs::create_dir_all(&parent).map_err(|e| NetworkError::archive_io(&parent, &e))?;
    tempfile::Builder::new()
        .prefix("tap-")
        .tempdir_in(&parent)
        .map_err(|e| NetworkError::archive_io(&parent, &e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(InstallStage::FetchedVerified.to_string(), "fetched-verified");
        assert_eq!(InstallStage::Checked.to_string(), "checked");
    }

    #[test]
    fn test_scratch_dir_is_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let nested = parent.path().join("work");
        let scratch = scratch_dir(Some(nested.as_path())).unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.starts_with(&nested));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("tap-"));
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_dir_failure_is_fetch_failure() {
        let parent = tempfile::tempdir().unwrap();
        let blocker = parent.path().join("occupied");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = scratch_dir(Some(blocker.join("work").as_path())).unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::ArchiveIo { .. })
        ));
        assert_eq!(err.failure_kind().exit_code(), 3);
    }
}
