//! Report type definitions for operations

use crate::{PlatformKey, ReleaseVersion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tap_hash::Sha256Digest;

/// Installation report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstallReport {
    /// Formula that was installed
    pub name: String,
    pub version: ReleaseVersion,
    pub platform: PlatformKey,
    /// Archive the binary came from
    pub url: String,
    /// Verified archive checksum
    pub checksum: Sha256Digest,
    /// Where the executable now lives
    pub artifact: PathBuf,
    /// Archive size in bytes
    pub bytes_downloaded: u64,
    /// Total execution time
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}
