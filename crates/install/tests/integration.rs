//! Integration tests for install crate

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tap_errors::{Error, FailureKind, InstallError, IntegrityError, NetworkError, PlatformError};
    use tap_hash::Sha256Digest;
    use tap_install::*;
    use tap_net::{DownloadResult, Downloader};
    use tap_platform::{CommandOutput, PlatformCommand, ProcessOperations};
    use tap_types::{
        Architecture, ChecksumManifest, DescriptorTable, OperatingSystem, PlatformKey,
        ReleaseVersion,
    };
    use tempfile::tempdir;

    const LINUX_AMD64: PlatformKey = PlatformKey::new(OperatingSystem::Linux, Architecture::Amd64);
    const SCRIPT: &[u8] = b"#!/bin/sh\nexit 0\n";

    fn tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Embedded table stamped as release 1.2.3 with `archive` as every platform's bytes
    fn table_for(archive: &[u8]) -> DescriptorTable {
        let base = DescriptorTable::embedded().unwrap();
        let version = ReleaseVersion::parse("1.2.3").unwrap();
        let digest = Sha256Digest::from_data(archive);
        let manifest: String = base
            .platforms()
            .map(|p| format!("{digest}  {}\n", base.archive_name(p, &version)))
            .collect();
        base.stamp(version, &ChecksumManifest::parse(&manifest).unwrap())
            .unwrap()
    }

    #[derive(Clone)]
    struct ServeBytes {
        body: Vec<u8>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ServeBytes {
        fn new(body: Vec<u8>) -> Self {
            Self {
                body,
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl Downloader for ServeBytes {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<DownloadResult, Error> {
            self.calls.lock().unwrap().push(url.to_string());
            tokio::fs::write(dest, &self.body).await?;
            Ok(DownloadResult {
                url: url.to_string(),
                size: self.body.len() as u64,
            })
        }
    }

    /// Wraps the real installer and counts invocations
    #[derive(Clone, Default)]
    struct CountingInstaller {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FileInstaller for CountingInstaller {
        async fn install_executable(
            &self,
            payload: &Payload,
            target_dir: &Path,
        ) -> Result<InstalledArtifact, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            AtomicFileInstaller::new()
                .install_executable(payload, target_dir)
                .await
        }
    }

    /// Reports a fixed exit code and records what it was asked to run
    #[derive(Clone)]
    struct ScriptedProcess {
        exit_code: i32,
        stderr: &'static str,
        seen: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    }

    impl ScriptedProcess {
        fn exiting(exit_code: i32) -> Self {
            Self {
                exit_code,
                stderr: "",
                seen: Arc::default(),
            }
        }
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code << 8)
    }

    #[cfg(windows)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code.unsigned_abs())
    }

    #[async_trait]
    impl ProcessOperations for ScriptedProcess {
        async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandOutput, Error> {
            self.seen
                .lock()
                .unwrap()
                .push((cmd.program().to_path_buf(), cmd.get_args().to_vec()));
            Ok(CommandOutput {
                status: exit_status(self.exit_code),
                stdout: b"notte 1.2.3\n".to_vec(),
                stderr: self.stderr.as_bytes().to_vec(),
            })
        }
    }

    struct Harness {
        installer: ReleaseInstaller,
        downloads: Arc<Mutex<Vec<String>>>,
        installs: Arc<AtomicUsize>,
        processes: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    }

    fn harness(table: DescriptorTable, served: Vec<u8>, process: ScriptedProcess) -> Harness {
        let downloader = ServeBytes::new(served);
        let file_installer = CountingInstaller::default();
        Harness {
            downloads: downloader.calls.clone(),
            installs: file_installer.calls.clone(),
            processes: process.seen.clone(),
            installer: ReleaseInstaller::new(
                table,
                Box::new(downloader),
                Box::new(file_installer),
                Box::new(process),
            ),
        }
    }

    fn request(bin_dir: &Path, work_dir: &Path) -> InstallRequest {
        InstallRequest {
            platform: LINUX_AMD64,
            version: "1.2.3".to_string(),
            bin_dir: bin_dir.to_path_buf(),
            work_dir: Some(work_dir.to_path_buf()),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_linux_amd64() {
        let archive = tar_gz(&[("notte", SCRIPT, 0o755)]);
        let h = harness(table_for(&archive), archive.clone(), ScriptedProcess::exiting(0));
        let temp = tempdir().unwrap();
        let bin = temp.path().join("bin");
        let work = temp.path().join("work");

        let report = h.installer.run(&request(&bin, &work)).await.unwrap();

        assert!(report.url.ends_with("_1.2.3_linux_amd64.tar.gz"));
        assert_eq!(report.name, "notte");
        assert_eq!(report.version.to_string(), "1.2.3");
        assert_eq!(report.platform, LINUX_AMD64);
        assert_eq!(report.checksum, Sha256Digest::from_data(&archive));
        assert_eq!(report.bytes_downloaded, archive.len() as u64);
        assert_eq!(report.artifact, bin.join("notte"));
        assert_eq!(std::fs::read(bin.join("notte")).unwrap(), SCRIPT);

        assert_eq!(*h.downloads.lock().unwrap(), vec![report.url.clone()]);
        assert_eq!(h.installs.load(Ordering::SeqCst), 1);
        assert_eq!(
            *h.processes.lock().unwrap(),
            vec![(bin.join("notte"), vec!["version".to_string()])]
        );

        // Scratch directory is gone once the run finishes
        assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_altered_byte_is_integrity_mismatch_and_never_installs() {
        let archive = tar_gz(&[("notte", SCRIPT, 0o755)]);
        let mut tampered = archive.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;

        let h = harness(table_for(&archive), tampered.clone(), ScriptedProcess::exiting(0));
        let temp = tempdir().unwrap();
        let bin = temp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("notte"), b"previous").unwrap();

        let err = h
            .installer
            .run(&request(&bin, temp.path()))
            .await
            .unwrap_err();

        match &err {
            Error::Integrity(IntegrityError::Mismatch {
                expected, actual, ..
            }) => {
                assert_eq!(*expected, Sha256Digest::from_data(&archive).to_hex());
                assert_eq!(*actual, Sha256Digest::from_data(&tampered).to_hex());
            }
            other => panic!("expected integrity mismatch, got {other:?}"),
        }
        assert_eq!(err.failure_kind(), FailureKind::Integrity);
        assert_eq!(h.installs.load(Ordering::SeqCst), 0);
        assert!(h.processes.lock().unwrap().is_empty());
        assert_eq!(std::fs::read(bin.join("notte")).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_fetch_and_verify_removes_rejected_archive() {
        let archive = tar_gz(&[("notte", SCRIPT, 0o755)]);
        let h = harness(table_for(&archive), b"not it".to_vec(), ScriptedProcess::exiting(0));
        let work = tempdir().unwrap();

        let descriptor = h.installer.resolve(LINUX_AMD64, "1.2.3").unwrap();
        let err = h
            .installer
            .fetch_and_verify(&descriptor, work.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Integrity(_)));
        assert!(!work.path().join(descriptor.archive_name()).exists());
    }

    /// Claims success without leaving a file behind
    struct VanishingDownload;

    #[async_trait]
    impl Downloader for VanishingDownload {
        async fn fetch(&self, url: &str, _dest: &Path) -> Result<DownloadResult, Error> {
            Ok(DownloadResult {
                url: url.to_string(),
                size: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_unreadable_archive_is_fetch_failure() {
        let archive = tar_gz(&[("notte", SCRIPT, 0o755)]);
        let installer = ReleaseInstaller::new(
            table_for(&archive),
            Box::new(VanishingDownload),
            Box::new(CountingInstaller::default()),
            Box::new(ScriptedProcess::exiting(0)),
        );
        let work = tempdir().unwrap();

        let descriptor = installer.resolve(LINUX_AMD64, "1.2.3").unwrap();
        let err = installer
            .fetch_and_verify(&descriptor, work.path())
            .await
            .unwrap_err();

        match &err {
            Error::Network(NetworkError::ArchiveIo { path, .. }) => {
                assert!(path.ends_with(descriptor.archive_name()));
            }
            other => panic!("expected archive I/O failure, got {other:?}"),
        }
        assert_eq!(err.failure_kind().exit_code(), 3);
    }

    #[tokio::test]
    async fn test_unusable_work_dir_is_fetch_failure() {
        let archive = tar_gz(&[("notte", SCRIPT, 0o755)]);
        let h = harness(table_for(&archive), archive, ScriptedProcess::exiting(0));
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("occupied");
        std::fs::write(&blocker, b"file").unwrap();

        let err = h
            .installer
            .run(&request(&temp.path().join("bin"), &blocker.join("work")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(NetworkError::ArchiveIo { .. })));
        assert_eq!(err.failure_kind(), FailureKind::Fetch);
        assert!(h.downloads.lock().unwrap().is_empty());
        assert_eq!(h.installs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_platform_performs_no_download() {
        let archive = tar_gz(&[("notte", SCRIPT, 0o755)]);
        let mut table = table_for(&archive);
        table.assets.retain(|a| a.os != OperatingSystem::Linux);
        let h = harness(table, archive, ScriptedProcess::exiting(0));
        let temp = tempdir().unwrap();

        let err = h
            .installer
            .run(&request(&temp.path().join("bin"), temp.path()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Platform(PlatformError::UnsupportedPlatform { ref platform }) if platform == "linux-amd64"
        ));
        assert_eq!(err.failure_kind(), FailureKind::Resolution);
        assert!(h.downloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_payload_fails_install() {
        let archive = tar_gz(&[("README.md", b"docs", 0o644)]);
        let h = harness(table_for(&archive), archive, ScriptedProcess::exiting(0));
        let temp = tempdir().unwrap();
        let bin = temp.path().join("bin");

        let err = h
            .installer
            .run(&request(&bin, temp.path()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Install(InstallError::MissingPayload { ref entry, .. }) if entry == "notte"
        ));
        assert_eq!(err.failure_kind().exit_code(), 5);
        assert_eq!(h.installs.load(Ordering::SeqCst), 0);
        assert!(!bin.join("notte").exists());
    }

    #[tokio::test]
    async fn test_nonzero_self_check_fails_run() {
        let archive = tar_gz(&[("notte-cli/notte", SCRIPT, 0o755)]);
        let mut process = ScriptedProcess::exiting(2);
        process.stderr = "unknown command";
        let h = harness(table_for(&archive), archive, process);
        let temp = tempdir().unwrap();

        let err = h
            .installer
            .run(&request(&temp.path().join("bin"), temp.path()))
            .await
            .unwrap_err();

        match &err {
            Error::Install(InstallError::SelfCheckFailed { message, .. }) => {
                assert!(message.contains("status 2"));
                assert!(message.contains("unknown command"));
            }
            other => panic!("expected self-check failure, got {other:?}"),
        }
        assert_eq!(err.failure_kind(), FailureKind::SelfCheck);
        assert_eq!(h.installs.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_self_check_runs_real_process() {
        use tap_platform::TokioProcess;

        let temp = tempdir().unwrap();
        let ok = write_atomic(SCRIPT, temp.path(), "notte", 0o755).unwrap();
        let bad = write_atomic(
            &b"#!/bin/sh\necho broken >&2\nexit 3\n"[..],
            temp.path(),
            "notte-bad",
            0o755,
        )
        .unwrap();

        run_self_check(&TokioProcess, &ok).await.unwrap();

        let err = run_self_check(&TokioProcess, &bad).await.unwrap_err();
        assert!(err.to_string().contains("status 3"));
        assert!(err.to_string().contains("broken"));

        let missing = run_self_check(&TokioProcess, &temp.path().join("absent"))
            .await
            .unwrap_err();
        assert_eq!(missing.failure_kind(), FailureKind::SelfCheck);
    }
}
