use std::process::Command;

use super::{CommandOutput, Shell, ShellCommand};

/// Run a rendered command line through the platform shell.
pub fn execute_local_command(command: &str) -> CommandOutput {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    match cmd.output() {
        Ok(out) => CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        },
        Err(e) => CommandOutput::failed(-1, format!("Command error: {}", e)),
    }
}

/// The operator's machine.
#[derive(Debug, Clone, Default)]
pub struct LocalShell;

impl Shell for LocalShell {
    fn run(&self, command: &ShellCommand) -> CommandOutput {
        let line = command.render();
        log_status!("local", "{}", line);
        execute_local_command(&line)
    }

    fn host(&self) -> &str {
        "localhost"
    }
}
