#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for tap
//!
//! This crate provides the platform key, release version, descriptor table
//! and report types shared by every other crate.

pub mod platform;
pub mod release;
pub mod reports;
pub mod version;

// Re-export commonly used types
pub use platform::{Architecture, OperatingSystem, PlatformKey};
pub use release::{AssetEntry, ChecksumManifest, DescriptorTable, ReleaseDescriptor};
pub use reports::InstallReport;
pub use version::ReleaseVersion;
