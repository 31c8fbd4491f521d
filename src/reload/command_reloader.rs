use std::process::Stdio;

use compio::process::Command;
use snafu::ResultExt;
use tracing::{debug, info};

use crate::reload::reloader::{SpawnSnafu, UnsuccessfulCommandSnafu, WaitSnafu};
use crate::reload::{ReloadError, ReloaderTrait};

/// Runs a shell command, e.g. `systemctl reload puma`, and expects it to succeed.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    command: String,
}

impl CommandReloader {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Returns the shell and its arguments used to run the command.
    fn shell_command(&self) -> (&'static str, [&str; 2]) {
        #[cfg(target_family = "windows")]
        {
            ("cmd", ["/C", &self.command])
        }
        #[cfg(target_family = "unix")]
        {
            ("sh", ["-c", &self.command])
        }
    }

    fn create_command(&self) -> Command {
        let (shell, args) = self.shell_command();
        let mut cmd = Command::new(shell);
        cmd.args(args);
        let _ = cmd.stdin(Stdio::null());
        cmd
    }
}

impl ReloaderTrait for CommandReloader {
    async fn reload(&self) -> Result<(), ReloadError> {
        debug!("Running reload command '{}'", self.command);
        let mut child = self.create_command().spawn().context(SpawnSnafu {
            command: &self.command,
        })?;

        let status = child.wait().await.context(WaitSnafu {
            command: &self.command,
        })?;

        if !status.success() {
            return UnsuccessfulCommandSnafu {
                command: &self.command,
                status: status.code().unwrap_or(-1),
            }
            .fail();
        }

        info!("Reload command '{}' completed successfully", self.command);
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[compio::test]
    async fn succeeds_when_the_command_exits_cleanly() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let marker = temp_dir.path().join("reloaded");

        CommandReloader::new(format!("echo done > '{}'", marker.display()))
            .reload()
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "done\n");
    }

    #[compio::test]
    async fn reports_the_exit_code_of_a_failing_command() {
        let result = CommandReloader::new("exit 3").reload().await;

        match result {
            Err(ReloadError::UnsuccessfulCommand { status, .. }) => assert_eq!(status, 3),
            other => panic!("Expected UnsuccessfulCommand, got {other:?}"),
        }
    }
}
