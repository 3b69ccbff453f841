use std::process::Command;

use super::local::execute_local_command;
use super::{CommandOutput, Shell, ShellCommand};
use crate::error::{Error, Result};
use crate::settings::{DeploySettings, DEFAULT_SSH_PORT};

/// Runs commands on the deployment host through the system `ssh` binary.
pub struct SshClient {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub identity_file: Option<String>,
    /// When true, all commands run locally instead of over SSH.
    /// Set automatically when the host is localhost/127.0.0.1/::1.
    pub is_local: bool,
}

impl SshClient {
    pub fn from_settings(settings: &DeploySettings) -> Result<Self> {
        let identity_file = match &settings.identity_file {
            Some(path) if !path.is_empty() => {
                let expanded = shellexpand::tilde(path).to_string();
                if !std::path::Path::new(&expanded).exists() {
                    return Err(Error::ssh_identity_file_not_found(expanded)
                        .with_hint("Check IDENTITY_FILE in your settings"));
                }
                Some(expanded)
            }
            _ => None,
        };

        let is_local = is_local_host(&settings.host);
        if is_local {
            log_status!("ssh", "Host '{}' is localhost, using local execution", settings.host);
        }

        Ok(Self {
            host: settings.host.clone(),
            user: settings.user.clone(),
            port: settings.port,
            identity_file,
            is_local,
        })
    }

    pub(crate) fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        if self.port != DEFAULT_SSH_PORT {
            args.push("-p".to_string());
            args.push(self.port.to_string());
        }

        // BatchMode keeps a missing key from turning into a password prompt.
        args.extend([
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
            "-o".to_string(),
            "ServerAliveInterval=15".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ]);

        args.push(format!("{}@{}", self.user, self.host));
        args.push(command.to_string());

        args
    }

    pub fn execute(&self, command: &str) -> CommandOutput {
        if self.is_local {
            return execute_local_command(command);
        }

        let args = self.build_ssh_args(command);

        match Command::new("ssh").args(&args).output() {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput::failed(-1, format!("SSH error: {}", e)),
        }
    }
}

impl Shell for SshClient {
    fn run(&self, command: &ShellCommand) -> CommandOutput {
        let line = command.render();
        log_status!("ssh", "{}@{}: {}", self.user, self.host, line);
        self.execute(&line)
    }

    fn host(&self) -> &str {
        &self.host
    }
}

pub fn is_local_host(host: &str) -> bool {
    matches!(
        host.trim().to_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "::1"
    )
}
