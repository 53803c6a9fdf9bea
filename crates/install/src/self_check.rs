//! Post-install smoke test

use std::path::Path;
use std::process::ExitStatus;
use tap_errors::{Error, InstallError};
use tap_platform::{PlatformCommand, ProcessOperations};
use tracing::{debug, warn};

/// Argument the installed executable is invoked with
pub const SELF_CHECK_ARG: &str = "version";

/// Bytes of stderr kept in a failure message
const STDERR_TAIL: usize = 512;

/// Run `<path> version` and require a zero exit status
///
/// Output is captured but only the status decides the outcome.
///
/// # Errors
///
/// Returns [`InstallError::SelfCheckFailed`] if the process cannot be
/// spawned, exits nonzero, or is terminated by a signal.
pub async fn run_self_check(process: &dyn ProcessOperations, path: &Path) -> Result<(), Error> {
    let mut cmd = PlatformCommand::new(path);
    cmd.arg(SELF_CHECK_ARG);

    let output = process.execute_command(cmd).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "self-check could not start");
        failed(path, format!("could not run: {e}"))
    })?;

    if output.status.success() {
        debug!(
            path = %path.display(),
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "self-check passed"
        );
        return Ok(());
    }

    let mut message = describe_status(output.status);
    let tail = stderr_tail(&output.stderr);
    if !tail.is_empty() {
        message.push_str(": ");
        message.push_str(&tail);
    }
    warn!(path = %path.display(), %message, "self-check failed");
    Err(failed(path, message))
}

fn failed(path: &Path, message: String) -> Error {
    InstallError::SelfCheckFailed {
        path: path.display().to_string(),
        message,
    }
    .into()
}

fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exited with status {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {signal}");
        }
    }
    "terminated abnormally".to_string()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
