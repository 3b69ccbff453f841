use serde::Serialize;
use std::cell::RefCell;

use super::{CommandOutput, Shell, ShellCommand};

/// A command seen by a [`RecordingShell`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedCommand {
    pub host: String,
    pub line: String,
    pub sudo: bool,
}

/// Executes nothing: records each command and answers from a script.
///
/// Responses are matched by substring against the rendered command line, first
/// match wins. Unmatched commands succeed with empty output.
pub struct RecordingShell {
    host: String,
    responses: Vec<(String, CommandOutput)>,
    issued: RefCell<Vec<RecordedCommand>>,
}

impl RecordingShell {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            responses: Vec::new(),
            issued: RefCell::new(Vec::new()),
        }
    }

    pub fn respond(self, pattern: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.respond_with(pattern, CommandOutput::ok(stdout))
    }

    pub fn fail(self, pattern: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        self.respond_with(pattern, CommandOutput::failed(exit_code, stderr))
    }

    pub fn respond_with(mut self, pattern: impl Into<String>, output: CommandOutput) -> Self {
        self.responses.push((pattern.into(), output));
        self
    }

    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.issued.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.issued.borrow().iter().map(|c| c.line.clone()).collect()
    }

    /// Recorded command lines containing `pattern`.
    pub fn matching(&self, pattern: &str) -> Vec<String> {
        self.issued
            .borrow()
            .iter()
            .filter(|c| c.line.contains(pattern))
            .map(|c| c.line.clone())
            .collect()
    }
}

impl Shell for RecordingShell {
    fn run(&self, command: &ShellCommand) -> CommandOutput {
        let line = command.render();
        log_status!("dry-run", "{}: {}", self.host, line);

        let output = self
            .responses
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""));

        self.issued.borrow_mut().push(RecordedCommand {
            host: self.host.clone(),
            line,
            sudo: command.is_sudo(),
        });

        output
    }

    fn host(&self) -> &str {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_and_answers_by_substring() {
        let shell = RecordingShell::new("h")
            .respond("status --porcelain", " M src/lib.rs")
            .fail("migrate", 1, "boom");

        let out = shell.run(&ShellCommand::new("git").args(["status", "--porcelain"]));
        assert_eq!(out.stdout, " M src/lib.rs");

        let out = shell.sudo(&ShellCommand::new("./manage.py").arg("migrate"));
        assert!(!out.success);
        assert_eq!(out.stderr, "boom");

        let out = shell.run(&ShellCommand::new("uptime"));
        assert!(out.success);

        let recorded = shell.commands();
        assert_eq!(recorded.len(), 3);
        assert!(recorded[1].sudo);
        assert_eq!(recorded[1].line, "sudo -n ./manage.py migrate");
        assert_eq!(shell.matching("git"), vec!["git status --porcelain"]);
    }
}
