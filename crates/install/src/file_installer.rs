//! Atomic placement of the executable into the bin directory
//!
//! The payload is written to a temporary file in the target directory,
//! synced, then renamed over the final path. A reader of `<bin_dir>/<name>`
//! sees either the previous file or the complete new one, never a partial
//! write.

use async_trait::async_trait;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tap_errors::{Error, InstallError};
use tap_hash::Sha256Digest;
use tokio::task;
use tracing::debug;

use crate::archive::Payload;

/// An executable that has been placed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    pub path: PathBuf,
    pub size: u64,
    /// Digest of the installed executable, not of the archive
    pub digest: Sha256Digest,
}

/// Capability to place an executable into a directory
#[async_trait]
pub trait FileInstaller: Send + Sync {
    /// Write `payload` to `target_dir/<payload.name>`
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::FilesystemError`] on any write failure.
    async fn install_executable(
        &self,
        payload: &Payload,
        target_dir: &Path,
    ) -> Result<InstalledArtifact, Error>;
}

/// [`FileInstaller`] that writes through a temp file and renames into place
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicFileInstaller;

impl AtomicFileInstaller {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileInstaller for AtomicFileInstaller {
    async fn install_executable(
        &self,
        payload: &Payload,
        target_dir: &Path,
    ) -> Result<InstalledArtifact, Error> {
        let payload = payload.clone();
        let target_dir = target_dir.to_path_buf();

        task::spawn_blocking(move || {
            let digest = Sha256Digest::from_data(&payload.bytes);
            let size = payload.bytes.len() as u64;
            let path = write_atomic(
                payload.bytes.as_slice(),
                &target_dir,
                &payload.name,
                payload.mode,
            )?;
            Ok(InstalledArtifact { path, size, digest })
        })
        .await
        .map_err(|e| InstallError::TaskError {
            message: format!("install task failed: {e}"),
        })?
    }
}

fn fs_error(operation: &str, path: &Path, err: &std::io::Error) -> Error {
    InstallError::FilesystemError {
        operation: operation.to_string(),
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

/// Copy `reader` to `target_dir/name` atomically with permission `mode`
///
/// The temporary file is removed on every error path.
///
/// # Errors
///
/// Returns [`InstallError::FilesystemError`] naming the failed operation.
pub fn write_atomic<R: Read>(
    mut reader: R,
    target_dir: &Path,
    name: &str,
    mode: u32,
) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(target_dir).map_err(|e| fs_error("create_dir", target_dir, &e))?;

    let final_path = target_dir.join(name);
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(target_dir)
        .map_err(|e| fs_error("create_temp", target_dir, &e))?;

    std::io::copy(&mut reader, temp.as_file_mut())
        .map_err(|e| fs_error("write", temp.path(), &e))?;
    temp.as_file_mut()
        .flush()
        .map_err(|e| fs_error("write", temp.path(), &e))?;

    set_mode(temp.as_file(), mode).map_err(|e| fs_error("set_permissions", temp.path(), &e))?;

    temp.as_file()
        .sync_all()
        .map_err(|e| fs_error("sync", temp.path(), &e))?;

    temp.persist(&final_path)
        .map_err(|e| fs_error("rename", &final_path, &e.error))?;

    debug!(path = %final_path.display(), mode = %format!("{mode:o}"), "installed executable");
    Ok(final_path)
}

#[cfg(unix)]
fn set_mode(file: &std::fs::File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &std::fs::File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Yields some bytes, then fails as if the process were interrupted
    struct InterruptedReader {
        sent: bool,
    }

    impl Read for InterruptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "interrupted"))
            } else {
                self.sent = true;
                let chunk = b"#!/bin/sh\n# trunc";
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok(chunk.len())
            }
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_install_executable_creates_dir_and_file() {
        let temp = tempfile::tempdir().unwrap();
        let bin = temp.path().join("prefix").join("bin");
        let payload = Payload {
            name: "notte".to_string(),
            bytes: b"binary".to_vec(),
            mode: 0o755,
        };

        let artifact = AtomicFileInstaller::new()
            .install_executable(&payload, &bin)
            .await
            .unwrap();

        assert_eq!(artifact.path, bin.join("notte"));
        assert_eq!(artifact.size, 6);
        assert_eq!(artifact.digest, Sha256Digest::from_data(b"binary"));
        assert_eq!(std::fs::read(&artifact.path).unwrap(), b"binary");
        assert_eq!(dir_entries(&bin), vec!["notte"]);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&artifact.path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_overwrites_existing_binary() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("notte"), b"old").unwrap();

        write_atomic(&b"new"[..], temp.path(), "notte", 0o755).unwrap();
        assert_eq!(std::fs::read(temp.path().join("notte")).unwrap(), b"new");
    }

    #[test]
    fn test_interrupted_write_keeps_previous_version() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("notte");
        std::fs::write(&target, b"old version").unwrap();

        let err = write_atomic(InterruptedReader { sent: false }, temp.path(), "notte", 0o755)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Install(InstallError::FilesystemError { ref operation, .. }) if operation == "write"
        ));
        assert_eq!(std::fs::read(&target).unwrap(), b"old version");
        assert_eq!(dir_entries(temp.path()), vec!["notte"]);
    }

    #[test]
    fn test_interrupted_write_leaves_nothing_when_absent() {
        let temp = tempfile::tempdir().unwrap();

        assert!(write_atomic(InterruptedReader { sent: false }, temp.path(), "notte", 0o755).is_err());
        assert!(dir_entries(temp.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_dir_is_filesystem_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let locked = temp.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory permissions; nothing to assert there.
        let canary = locked.join(".canary");
        if std::fs::write(&canary, b"").is_ok() {
            return;
        }

        let err = write_atomic(&b"x"[..], &locked, "notte", 0o755).unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::FilesystemError { .. })
        ));
        assert_eq!(err.failure_kind().exit_code(), 5);
    }
}
