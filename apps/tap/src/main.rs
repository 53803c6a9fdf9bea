//! tap - installer for pre-built notte CLI releases
//!
//! Resolves the release archive for this platform from the descriptor
//! table, downloads and verifies it, installs the executable and runs its
//! self-check. Each failure category exits with its own status code.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands, TargetArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use std::path::Path;
use std::process;
use tap_config::Config;
use tap_errors::ConfigError;
use tap_install::{run_self_check, AtomicFileInstaller, InstallRequest, ReleaseInstaller};
use tap_net::{HttpDownloader, NetClient, NetConfig};
use tap_platform::TokioProcess;
use tap_types::{ChecksumManifest, DescriptorTable, PlatformKey, ReleaseVersion};
use tracing::{debug, error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    let renderer = OutputRenderer::new(json_mode);
    if let Err(e) = run(cli, &renderer).await {
        error!(kind = %e.failure_kind(), "{e}");
        renderer.render_error(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run(cli: Cli, renderer: &OutputRenderer) -> Result<(), CliError> {
    info!("Starting tap v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.command);

    match cli.command {
        Commands::Install {
            version, target, ..
        } => {
            let table = load_table(config.paths.table.as_deref()).await?;
            let platform = target_platform(&target)?;
            let version = version.unwrap_or_else(|| table.version.to_string());
            let bin_dir = config.bin_dir()?;

            let client = NetClient::new(NetConfig::from(&config.network))?;
            let installer = ReleaseInstaller::new(
                table,
                Box::new(HttpDownloader::new(client)),
                Box::new(AtomicFileInstaller::new()),
                Box::new(TokioProcess),
            );

            let request = InstallRequest {
                platform,
                version,
                bin_dir,
                work_dir: Some(config.temp_dir()),
            };
            let report = installer.run(&request).await?;
            renderer.render_install_report(&report)?;

            if !cli.global.json {
                show_path_reminder_if_needed(&request.bin_dir);
            }
        }

        Commands::Resolve { version, target } => {
            let table = load_table(config.paths.table.as_deref()).await?;
            let platform = target_platform(&target)?;
            let version = version.unwrap_or_else(|| table.version.to_string());
            let descriptor = table.resolve(platform, &version)?;
            renderer.render_descriptor(&descriptor)?;
        }

        Commands::Platforms { .. } => {
            let table = load_table(config.paths.table.as_deref()).await?;
            renderer.render_platforms(&table)?;
        }

        Commands::Check { path } => {
            run_self_check(&TokioProcess, &path).await?;
            renderer.render_check(&path)?;
        }

        Commands::Stamp {
            version,
            checksums,
            output,
            ..
        } => {
            let table = load_table(config.paths.table.as_deref()).await?;
            let version = ReleaseVersion::parse(&version)?;
            let manifest_text = tokio::fs::read_to_string(&checksums)
                .await
                .map_err(|_| ConfigError::NotFound {
                    path: checksums.display().to_string(),
                })?;
            let manifest = ChecksumManifest::parse(&manifest_text)?;
            let stamped = table.stamp(version, &manifest)?;
            let rendered = stamped.to_toml_string()?;

            match output {
                Some(output) => {
                    tokio::fs::write(&output, rendered)
                        .await
                        .map_err(|e| ConfigError::WriteError {
                            path: output.display().to_string(),
                            error: e.to_string(),
                        })?;
                    renderer.render_stamped(&stamped, &output)?;
                }
                None => renderer.render_stamped_toml(&stamped, &rendered)?,
            }
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, command: &Commands) {
    let table = match command {
        Commands::Install { target, .. } | Commands::Resolve { target, .. } => {
            target.table.as_ref()
        }
        Commands::Platforms { table } | Commands::Stamp { table, .. } => table.as_ref(),
        Commands::Check { .. } => None,
    };
    if let Some(table) = table {
        config.paths.table = Some(table.clone());
    }

    if let Commands::Install {
        bin_dir: Some(bin_dir),
        ..
    } = command
    {
        config.paths.bin_dir = Some(bin_dir.clone());
    }
}

/// Descriptor table from `path`, or the one built into this binary
async fn load_table(path: Option<&Path>) -> Result<DescriptorTable, CliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading descriptor table");
            let contents =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|_| ConfigError::NotFound {
                        path: path.display().to_string(),
                    })?;
            Ok(DescriptorTable::from_toml_str(&contents)?)
        }
        None => Ok(DescriptorTable::embedded()?),
    }
}

/// Platform named on the command line, or this host's
fn target_platform(target: &TargetArgs) -> Result<PlatformKey, CliError> {
    let platform = match target.platform.as_deref() {
        Some(raw) => raw.parse::<PlatformKey>()?,
        None => PlatformKey::detect()?,
    };
    debug!(%platform, "target platform");
    Ok(platform)
}

/// Initialize tracing/logging
///
/// Logs always go to stderr so stdout carries only command output.
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let default_filter = if debug_enabled_flag {
        "info,tap=debug,tap_install=debug,tap_net=debug,tap_platform=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(debug_enabled_flag)
            .with_env_filter(filter)
            .init();
    }
}

/// Show PATH reminder if needed
fn show_path_reminder_if_needed(bin_dir: &Path) {
    let on_path = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).any(|p| p == bin_dir))
        .unwrap_or(false);
    if !on_path {
        eprintln!();
        eprintln!("Add {} to your PATH to use notte:", bin_dir.display());
        eprintln!("   export PATH=\"{}:$PATH\"", bin_dir.display());
        eprintln!();
    }
}
