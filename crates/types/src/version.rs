//! Release version parsing
//!
//! Versions arrive from outside (a release trigger, the command line) and are
//! validated here once. Release tags carry a `v` prefix, so `v1.2.3` and
//! `1.2.3` name the same release.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tap_errors::VersionError;

/// A validated semantic release version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReleaseVersion(Version);

impl ReleaseVersion {
    /// Parse a version string, accepting a single leading `v`
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InvalidVersion`] when the input is empty,
    /// whitespace only, or not a semantic version.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if bare.is_empty() {
            return Err(VersionError::InvalidVersion {
                input: input.to_string(),
            });
        }

        Version::parse(bare)
            .map(Self)
            .map_err(|_| VersionError::InvalidVersion {
                input: input.to_string(),
            })
    }

}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReleaseVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ReleaseVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ReleaseVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_and_tagged() {
        let plain = ReleaseVersion::parse("1.2.3").unwrap();
        let tagged = ReleaseVersion::parse(" v1.2.3 ").unwrap();
        assert_eq!(plain, tagged);
        assert_eq!(plain.to_string(), "1.2.3");
    }

    #[test]
    fn test_prerelease_is_kept() {
        let v = ReleaseVersion::parse("0.4.0-rc.1").unwrap();
        assert_eq!(v.to_string(), "0.4.0-rc.1");
    }

    #[test]
    fn test_absent_or_malformed_is_invalid() {
        for input in ["", "   ", "v", "1.2", "latest", "vv1.2.3", "1.2.3.4"] {
            let err = ReleaseVersion::parse(input).unwrap_err();
            assert!(
                matches!(err, VersionError::InvalidVersion { input: ref i } if i == input),
                "{input:?} gave {err:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_numeric_versions_roundtrip(major in 0u64..1000, minor in 0u64..1000, patch in 0u64..1000) {
            let text = format!("{major}.{minor}.{patch}");
            let parsed = ReleaseVersion::parse(&text).unwrap();
            prop_assert_eq!(parsed.to_string(), text.clone());
            prop_assert_eq!(ReleaseVersion::parse(&format!("v{text}")).unwrap(), parsed);
        }

        #[test]
        fn prop_parse_never_panics(input in ".*") {
            let _ = ReleaseVersion::parse(&input);
        }
    }
}
