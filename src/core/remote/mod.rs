//! Command transport: the remote host over ssh, the operator's machine, and a
//! recording stand-in used by `--dry-run` and tests.

mod command;
mod local;
mod recording;
mod ssh;

pub use command::ShellCommand;
pub use local::{execute_local_command, LocalShell};
pub use recording::{RecordedCommand, RecordingShell};
pub use ssh::{is_local_host, SshClient};

use serde::Serialize;

use crate::error::{Error, RemoteCommandFailedDetails, Result, TargetDetails};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            exit_code: 0,
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            exit_code,
        }
    }

    /// stdout and stderr together, for output parsers that do not care which
    /// stream a tool wrote to.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Somewhere commands can be run.
pub trait Shell {
    fn run(&self, command: &ShellCommand) -> CommandOutput;

    fn sudo(&self, command: &ShellCommand) -> CommandOutput {
        self.run(&command.clone().with_sudo())
    }

    /// Host label for diagnostics.
    fn host(&self) -> &str;
}

/// Turn a non-zero exit into `remote.command_failed`.
pub fn ensure_success(
    output: CommandOutput,
    command: &ShellCommand,
    host: &str,
    task: Option<&str>,
) -> Result<CommandOutput> {
    if output.success {
        return Ok(output);
    }

    Err(Error::remote_command_failed(RemoteCommandFailedDetails {
        command: command.render(),
        exit_code: output.exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        target: TargetDetails {
            task: task.map(str::to_string),
            host: Some(host.to_string()),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_success_passes_output_through() {
        let cmd = ShellCommand::new("true");
        let out = ensure_success(CommandOutput::ok("fine"), &cmd, "h", None).unwrap();
        assert_eq!(out.stdout, "fine");
    }

    #[test]
    fn ensure_success_reports_command_and_target() {
        let cmd = ShellCommand::new("git").arg("pull").in_dir("/srv/app");
        let err = ensure_success(
            CommandOutput::failed(128, "fatal: not a git repository"),
            &cmd,
            "app.example.com",
            Some("pull"),
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "remote.command_failed");
        assert_eq!(err.details["command"], "cd '/srv/app' && git pull");
        assert_eq!(err.details["exitCode"], 128);
        assert_eq!(err.details["target"]["task"], "pull");
        assert_eq!(err.details["target"]["host"], "app.example.com");
    }

    #[test]
    fn combined_joins_streams() {
        let out = CommandOutput {
            stdout: "a".to_string(),
            stderr: "b".to_string(),
            success: false,
            exit_code: 1,
        };
        assert_eq!(out.combined(), "a\nb");
        assert_eq!(CommandOutput::failed(1, "only").combined(), "only");
    }
}
