//! Process execution operations

mod tokio_process;

pub use tokio_process::TokioProcess;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tap_errors::Error;

/// Platform-specific command builder and execution
#[derive(Debug, Clone)]
pub struct PlatformCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl PlatformCommand {
    /// Create a new platform command
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<str>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Render as a shell-like string for logs and error messages
    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// Output from command execution
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Trait for process execution operations
#[async_trait]
pub trait ProcessOperations: Send + Sync {
    /// Spawn a command, wait for it, and return its status and output
    ///
    /// A command that runs and exits nonzero is `Ok`; only a failure to
    /// spawn or wait is an error.
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandOutput, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let mut cmd = PlatformCommand::new("/usr/local/bin/notte");
        cmd.arg("version").args(["--json"]);

        assert_eq!(cmd.program(), Path::new("/usr/local/bin/notte"));
        assert_eq!(cmd.get_args(), ["version", "--json"]);
        assert_eq!(cmd.display(), "/usr/local/bin/notte version --json");
    }
}
