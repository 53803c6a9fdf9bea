//! Host platform identification
//!
//! A [`PlatformKey`] is the (operating system, architecture) pair used to
//! select a release archive. Only the four combinations below exist; whether a
//! given release table actually publishes an archive for a key is decided by
//! the table, not by this type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tap_errors::PlatformError;

/// Operating system family of a release archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperatingSystem {
    #[serde(rename = "darwin", alias = "macos")]
    MacOs,
    #[serde(rename = "linux")]
    Linux,
}

impl OperatingSystem {
    /// Token used in release archive names
    #[must_use]
    pub fn url_token(self) -> &'static str {
        match self {
            Self::MacOs => "darwin",
            Self::Linux => "linux",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "darwin" | "macos" | "osx" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url_token())
    }
}

/// CPU architecture of a release archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "arm64", alias = "aarch64")]
    Arm64,
    #[serde(rename = "amd64", alias = "x86_64")]
    Amd64,
}

impl Architecture {
    /// Token used in release archive names
    #[must_use]
    pub fn url_token(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::Amd64 => "amd64",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "arm64" | "aarch64" => Some(Self::Arm64),
            "amd64" | "x86_64" | "x64" => Some(Self::Amd64),
            _ => None,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url_token())
    }
}

/// (operating system, architecture) pair identifying one release archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformKey {
    pub os: OperatingSystem,
    pub arch: Architecture,
}

impl PlatformKey {
    /// Every platform a release may publish an archive for
    pub const ALL: [PlatformKey; 4] = [
        PlatformKey::new(OperatingSystem::MacOs, Architecture::Arm64),
        PlatformKey::new(OperatingSystem::MacOs, Architecture::Amd64),
        PlatformKey::new(OperatingSystem::Linux, Architecture::Arm64),
        PlatformKey::new(OperatingSystem::Linux, Architecture::Amd64),
    ];

    #[must_use]
    pub const fn new(os: OperatingSystem, arch: Architecture) -> Self {
        Self { os, arch }
    }

    /// Inspect the running host
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedPlatform`] when the host OS or CPU
    /// has no release archive.
    pub fn detect() -> Result<Self, PlatformError> {
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map `std::env::consts`-style names to a key
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedPlatform`] for any pair outside
    /// macos/linux and aarch64/x86_64.
    pub fn from_host(os: &str, arch: &str) -> Result<Self, PlatformError> {
        let os_key = match os {
            "macos" => Some(OperatingSystem::MacOs),
            "linux" => Some(OperatingSystem::Linux),
            _ => None,
        };
        let arch_key = match arch {
            "aarch64" => Some(Architecture::Arm64),
            "x86_64" => Some(Architecture::Amd64),
            _ => None,
        };

        match (os_key, arch_key) {
            (Some(os), Some(arch)) => Ok(Self::new(os, arch)),
            _ => Err(PlatformError::UnsupportedPlatform {
                platform: format!("{os}-{arch}"),
            }),
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl FromStr for PlatformKey {
    type Err = PlatformError;

    /// Parse `<os>-<arch>`, e.g. `linux-amd64` or `darwin-arm64`.
    ///
    /// A well-formed pair naming an unknown OS or CPU is reported as
    /// unsupported rather than invalid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let Some((os, arch)) = normalized.split_once(['-', '/']) else {
            return Err(PlatformError::InvalidPlatform {
                input: s.to_string(),
            });
        };
        if os.is_empty() || arch.is_empty() {
            return Err(PlatformError::InvalidPlatform {
                input: s.to_string(),
            });
        }

        match (OperatingSystem::from_token(os), Architecture::from_token(arch)) {
            (Some(os), Some(arch)) => Ok(Self::new(os, arch)),
            _ => Err(PlatformError::UnsupportedPlatform {
                platform: normalized,
            }),
        }
    }
}
