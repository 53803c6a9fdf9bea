#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Release installation for tap
//!
//! This crate turns a resolved release descriptor into a verified,
//! atomically placed executable and smoke-tests it. The network, the
//! filesystem write and the child process are each behind a trait so the
//! whole pipeline can run against doubles.

mod archive;
mod file_installer;
mod installer;
mod self_check;

pub use archive::{extract_payload, read_payload, Payload, DEFAULT_EXEC_MODE};
pub use file_installer::{write_atomic, AtomicFileInstaller, FileInstaller, InstalledArtifact};
pub use installer::{InstallRequest, InstallStage, ReleaseInstaller, VerifiedArchive};
pub use self_check::{run_self_check, SELF_CHECK_ARG};
