//! Platform abstraction layer for tap.
//!
//! Installed binaries are external collaborators: the only thing tap does
//! with them is run them. This crate provides the process execution seam so
//! the installer can be driven by a real child process in production and by
//! a scripted double in tests.

pub mod process;

pub use process::{CommandOutput, PlatformCommand, ProcessOperations, TokioProcess};
