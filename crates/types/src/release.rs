//! Release descriptor table
//!
//! The table maps each [`PlatformKey`] to the archive published for one
//! version. It is generated data: `stamp` rewrites it from the release
//! pipeline's `checksums.txt`, and it is never edited by hand.

use crate::{Architecture, OperatingSystem, PlatformKey, ReleaseVersion};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tap_errors::{ConfigError, Error, PlatformError, VersionError};
use tap_hash::Sha256Digest;

const EMBEDDED_TABLE: &str = include_str!("../release/notte.toml");

/// Template tokens substituted when rendering archive URLs
const VERSION_TOKEN: &str = "{version}";
const OS_TOKEN: &str = "{os}";
const ARCH_TOKEN: &str = "{arch}";

/// Published checksum of one platform archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub os: OperatingSystem,
    pub arch: Architecture,
    /// Hex SHA-256, or a placeholder in an unstamped table
    pub sha256: String,
}

impl AssetEntry {
    #[must_use]
    pub fn platform(&self) -> PlatformKey {
        PlatformKey::new(self.os, self.arch)
    }
}

/// Release formula: metadata plus one asset per supported platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorTable {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub license: String,
    /// Executable entry extracted from each archive
    pub binary: String,
    pub version: ReleaseVersion,
    pub url_template: String,
    pub assets: Vec<AssetEntry>,
}

/// Everything needed to fetch and verify one archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub platform: PlatformKey,
    pub version: ReleaseVersion,
    pub url: String,
    pub checksum: Sha256Digest,
}

impl ReleaseDescriptor {
    /// File name of the archive, taken from the last URL segment
    #[must_use]
    pub fn archive_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

impl DescriptorTable {
    /// The table compiled into this binary
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded table is malformed.
    pub fn embedded() -> Result<Self, Error> {
        Self::from_toml_str(EMBEDDED_TABLE)
    }

    /// Parse and validate a table
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the TOML is malformed, the URL template
    /// lacks a token, or a platform appears twice.
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        let table: Self = toml::from_str(input)?;
        table.validate()?;
        Ok(table)
    }

    /// Serialize back to TOML, with the generated-file banner
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        let body = toml::to_string(self).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })?;
        Ok(format!(
            "# Generated by `tap stamp` on each release. Manual changes will be overwritten.\n\n{body}"
        ))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.binary.is_empty() || self.binary.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "binary".to_string(),
                value: self.binary.clone(),
            }
            .into());
        }

        for token in [VERSION_TOKEN, OS_TOKEN, ARCH_TOKEN] {
            if !self.url_template.contains(token) {
                return Err(ConfigError::InvalidValue {
                    field: "url_template".to_string(),
                    value: format!("{} (missing {token})", self.url_template),
                }
                .into());
            }
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.platform()) {
                return Err(ConfigError::Invalid {
                    message: format!("duplicate asset for platform {}", asset.platform()),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Platforms this table publishes archives for, in table order
    pub fn platforms(&self) -> impl Iterator<Item = PlatformKey> + '_ {
        self.assets.iter().map(AssetEntry::platform)
    }

    /// Render the archive URL for a platform and version
    #[must_use]
    pub fn render_url(&self, platform: PlatformKey, version: &ReleaseVersion) -> String {
        self.url_template
            .replace(VERSION_TOKEN, &version.to_string())
            .replace(OS_TOKEN, platform.os.url_token())
            .replace(ARCH_TOKEN, platform.arch.url_token())
    }

    /// Archive file name for a platform and version
    #[must_use]
    pub fn archive_name(&self, platform: PlatformKey, version: &ReleaseVersion) -> String {
        let url = self.render_url(platform, version);
        url.rsplit('/').next().unwrap_or_default().to_string()
    }

    /// Look up the descriptor for `platform` at `version`
    ///
    /// Pure lookup: no I/O is performed.
    ///
    /// # Errors
    ///
    /// - [`VersionError::InvalidVersion`] if `version` is absent or malformed
    /// - [`PlatformError::UnsupportedPlatform`] if the table has no asset for `platform`
    /// - [`VersionError::NotPublished`] if `version` differs from the table's version
    /// - [`ConfigError::InvalidValue`] if the asset still carries a placeholder checksum
    pub fn resolve(
        &self,
        platform: PlatformKey,
        version: &str,
    ) -> Result<ReleaseDescriptor, Error> {
        let version = ReleaseVersion::parse(version)?;

        let asset = self
            .assets
            .iter()
            .find(|asset| asset.platform() == platform)
            .ok_or_else(|| PlatformError::UnsupportedPlatform {
                platform: platform.to_string(),
            })?;

        if version != self.version {
            return Err(VersionError::NotPublished {
                requested: version.to_string(),
                available: self.version.to_string(),
            }
            .into());
        }

        let checksum = Sha256Digest::from_hex(&asset.sha256).map_err(|_| {
            ConfigError::InvalidValue {
                field: format!("assets.sha256 ({platform})"),
                value: asset.sha256.clone(),
            }
        })?;

        Ok(ReleaseDescriptor {
            platform,
            url: self.render_url(platform, &version),
            version,
            checksum,
        })
    }

    /// Produce the table for a new release from its checksum manifest
    ///
    /// Every platform already listed in the table must have a line in
    /// `manifest`; a release missing any archive is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first archive absent
    /// from the manifest.
    pub fn stamp(
        &self,
        version: ReleaseVersion,
        manifest: &ChecksumManifest,
    ) -> Result<Self, Error> {
        let mut assets = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let archive = self.archive_name(asset.platform(), &version);
            let digest = manifest
                .get(&archive)
                .ok_or_else(|| ConfigError::MissingField {
                    field: format!("checksum for {archive}"),
                })?;
            assets.push(AssetEntry {
                os: asset.os,
                arch: asset.arch,
                sha256: digest.to_hex(),
            });
        }

        Ok(Self {
            version,
            assets,
            ..self.clone()
        })
    }
}

/// Parsed `checksums.txt` as written by release tooling and `sha256sum`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: BTreeMap<String, Sha256Digest>,
}

impl ChecksumManifest {
    /// Parse lines of `<sha256>  <file name>`
    ///
    /// Blank lines are skipped. A `*` before the file name (binary mode) is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] naming the offending line number.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut entries = BTreeMap::new();

        for (index, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parse_error = || ConfigError::ParseError {
                message: format!("checksums line {}: {line:?}", index + 1),
            };

            let (digest, file) = line.split_once(char::is_whitespace).ok_or_else(parse_error)?;
            let file = file.trim_start().trim_start_matches('*');
            if file.is_empty() {
                return Err(parse_error().into());
            }
            let digest = Sha256Digest::from_hex(digest).map_err(|_| parse_error())?;
            entries.insert(file.to_string(), digest);
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn get(&self, file: &str) -> Option<&Sha256Digest> {
        self.entries.get(file)
    }
}
