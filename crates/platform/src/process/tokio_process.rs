//! Process execution backed by `tokio::process`

use async_trait::async_trait;
use std::time::Instant;
use tap_errors::{Error, PlatformError};
use tokio::process::Command;
use tracing::debug;

use super::{CommandOutput, PlatformCommand, ProcessOperations};

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcess;

impl TokioProcess {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessOperations for TokioProcess {
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandOutput, Error> {
        let start = Instant::now();
        debug!(command = %cmd.display(), "spawning process");

        let mut command = Command::new(cmd.program());
        command.args(cmd.get_args()).kill_on_drop(true);

        let output = command
            .output()
            .await
            .map_err(|e| PlatformError::ProcessExecutionFailed {
                command: cmd.display(),
                message: e.to_string(),
            })?;

        debug!(
            command = %cmd.display(),
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "process finished"
        );

        Ok(CommandOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
