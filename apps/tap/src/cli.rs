//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tap - install pre-built notte CLI releases
#[derive(Parser)]
#[command(name = "tap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install pre-built notte CLI releases for this platform")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments shared by commands that select a release
#[derive(clap::Args, Clone, Debug, Default)]
pub struct TargetArgs {
    /// Target platform as OS-ARCH (default: this host)
    #[arg(long, value_name = "OS-ARCH")]
    pub platform: Option<String>,

    /// Descriptor table to use instead of the built-in one
    #[arg(long, value_name = "PATH")]
    pub table: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Download, verify and install a release
    #[command(alias = "i")]
    Install {
        /// Version to install (default: the table's release)
        version: Option<String>,

        /// Directory to place the executable in
        #[arg(long, value_name = "DIR")]
        bin_dir: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show the archive URL and checksum for a release without downloading
    Resolve {
        /// Version to resolve (default: the table's release)
        version: Option<String>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// List platforms the descriptor table publishes archives for
    Platforms {
        /// Descriptor table to use instead of the built-in one
        #[arg(long, value_name = "PATH")]
        table: Option<PathBuf>,
    },

    /// Run the post-install self-check against an existing executable
    Check {
        /// Path to the installed executable
        path: PathBuf,
    },

    /// Write a descriptor table for a new release from its checksums file
    Stamp {
        /// Release version being stamped
        #[arg(long)]
        version: String,

        /// checksums.txt produced by the release pipeline
        #[arg(long, value_name = "FILE")]
        checksums: PathBuf,

        /// Table to start from (default: the built-in one)
        #[arg(long, value_name = "PATH")]
        table: Option<PathBuf>,

        /// Write the table here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}
