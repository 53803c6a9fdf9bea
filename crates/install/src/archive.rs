//! Payload extraction from release archives
//!
//! Release archives are gzip-compressed tarballs holding the executable
//! either at the root or under one top-level directory. Only the named
//! executable is read; nothing else in the archive touches the filesystem.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};
use tap_errors::{Error, InstallError};
use tar::{Archive as TarArchive, EntryType};
use tokio::task;
use tracing::debug;

/// Mode applied when the archive records no executable bits
pub const DEFAULT_EXEC_MODE: u32 = 0o755;

/// Executable read out of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Unix permission bits to install with
    pub mode: u32,
}

impl Payload {
    /// Keep the recorded permission bits if any execute bit is set
    #[must_use]
    pub fn effective_mode(recorded: u32) -> u32 {
        let perms = recorded & 0o777;
        if perms & 0o111 == 0 {
            DEFAULT_EXEC_MODE
        } else {
            perms
        }
    }
}

/// Extract the entry called `name` from a `.tar.gz` file
///
/// # Errors
///
/// Returns [`InstallError::MissingPayload`] if no regular file with that name
/// exists at the root or one directory deep, and
/// [`InstallError::ExtractionFailed`] if the archive cannot be decoded.
pub async fn extract_payload(archive_path: &Path, name: &str) -> Result<Payload, Error> {
    let archive_path = archive_path.to_path_buf();
    let name = name.to_string();

    task::spawn_blocking(move || {
        let file = File::open(&archive_path).map_err(|e| InstallError::ExtractionFailed {
            message: format!("{}: {e}", archive_path.display()),
        })?;
        read_payload(file, &name, &archive_path)
    })
    .await
    .map_err(|e| InstallError::TaskError {
        message: format!("extraction task failed: {e}"),
    })?
}

/// Scan a gzip tar stream for the payload
///
/// # Errors
///
/// See [`extract_payload`].
pub fn read_payload<R: Read>(
    reader: R,
    name: &str,
    archive_path: &Path,
) -> Result<Payload, Error> {
    let extraction_failed = |e: std::io::Error| InstallError::ExtractionFailed {
        message: format!("{}: {e}", archive_path.display()),
    };

    let mut archive = TarArchive::new(GzDecoder::new(reader));
    for entry in archive.entries().map_err(extraction_failed)? {
        let mut entry = entry.map_err(extraction_failed)?;

        if !matches!(entry.header().entry_type(), EntryType::Regular | EntryType::Continuous) {
            continue;
        }

        let path = entry.path().map_err(extraction_failed)?.into_owned();
        if !is_payload_path(&path, name) {
            continue;
        }

        let recorded = entry.header().mode().map_err(extraction_failed)?;
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes).map_err(extraction_failed)?;

        debug!(
            archive = %archive_path.display(),
            entry = %path.display(),
            size = bytes.len(),
            mode = %format!("{recorded:o}"),
            "found payload"
        );

        return Ok(Payload {
            name: name.to_string(),
            bytes,
            mode: Payload::effective_mode(recorded),
        });
    }

    Err(InstallError::MissingPayload {
        entry: name.to_string(),
        archive: archive_path.file_name().map_or_else(
            || archive_path.display().to_string(),
            |f| f.to_string_lossy().into_owned(),
        ),
    }
    .into())
}

/// `name` or `<dir>/name`, ignoring `./` segments
fn is_payload_path(path: &Path, name: &str) -> bool {
    let components: Vec<Component<'_>> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    match components.as_slice() {
        [Component::Normal(file)] | [Component::Normal(_), Component::Normal(file)] => {
            file.to_str() == Some(name)
        }
        _ => false,
    }
}
