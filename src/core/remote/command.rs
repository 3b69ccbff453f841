use serde::Serialize;
use std::fmt;

use crate::utils::shell::{quote_args, quote_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
enum Body {
    Argv(Vec<String>),
    /// Operator-supplied command line, passed through verbatim.
    Script(String),
}

/// A command to run through a [`Shell`](super::Shell).
///
/// Built from an argument vector; every argument is quoted when rendered.
/// Directory scoping and sudo are part of the command rather than ambient
/// state of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellCommand {
    body: Body,
    #[serde(skip_serializing_if = "Option::is_none")]
    dir: Option<String>,
    sudo: bool,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            body: Body::Argv(vec![program.into()]),
            dir: None,
            sudo: false,
        }
    }

    /// Wrap a raw command line from the settings file.
    pub fn script(line: impl Into<String>) -> Self {
        Self {
            body: Body::Script(line.into()),
            dir: None,
            sudo: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        match &mut self.body {
            Body::Argv(argv) => argv.push(arg.into()),
            Body::Script(line) => {
                line.push(' ');
                line.push_str(&arg.into());
            }
        }
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().fold(self, |cmd, a| cmd.arg(a))
    }

    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    pub fn is_sudo(&self) -> bool {
        self.sudo
    }

    pub fn dir(&self) -> Option<&str> {
        self.dir.as_deref()
    }

    /// Program and arguments, unquoted. `None` for raw command lines.
    pub fn argv(&self) -> Option<&[String]> {
        match &self.body {
            Body::Argv(argv) => Some(argv),
            Body::Script(_) => None,
        }
    }

    /// The single command line handed to `sh -c` or ssh.
    pub fn render(&self) -> String {
        let body = match (&self.body, self.sudo) {
            (Body::Argv(argv), false) => quote_args(argv),
            (Body::Argv(argv), true) => format!("sudo -n {}", quote_args(argv)),
            (Body::Script(line), false) => line.clone(),
            (Body::Script(line), true) => format!("sudo -n sh -c {}", quote_path(line)),
        };

        match &self.dir {
            Some(dir) => format!("cd {} && {}", quote_path(dir), body),
            None => body,
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_quoted_argv() {
        let cmd = ShellCommand::new("git").args(["checkout", "release 1"]);
        assert_eq!(cmd.render(), "git checkout 'release 1'");
    }

    #[test]
    fn directory_scope_prefixes_cd() {
        let cmd = ShellCommand::new("git").arg("pull").in_dir("/srv/app");
        assert_eq!(cmd.render(), "cd '/srv/app' && git pull");
    }

    #[test]
    fn sudo_runs_non_interactively() {
        let cmd = ShellCommand::new("chown")
            .args(["deploy:www-data", "--recursive", "."])
            .in_dir("/srv/app")
            .with_sudo();
        assert_eq!(
            cmd.render(),
            "cd '/srv/app' && sudo -n chown deploy:www-data --recursive ."
        );
    }

    #[test]
    fn scripts_pass_through_and_wrap_for_sudo() {
        let cmd = ShellCommand::script("echo hi && touch done");
        assert_eq!(cmd.render(), "echo hi && touch done");
        assert_eq!(cmd.argv(), None);
        assert_eq!(
            cmd.with_sudo().render(),
            "sudo -n sh -c 'echo hi && touch done'"
        );
    }

    #[test]
    fn injected_values_cannot_break_out() {
        let cmd = ShellCommand::new("git").args(["checkout", "x; rm -rf /"]);
        assert_eq!(cmd.render(), "git checkout 'x; rm -rf /'");
    }
}
