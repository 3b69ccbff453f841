use serde_json::{Map, Value};

use super::{render_settings, Args, HookFlow, TaskInvocation, TaskOutcome, TaskRegistry};
use crate::error::Result;
use crate::remote::{ensure_success, CommandOutput, Shell, ShellCommand};
use crate::report::Reporter;
use crate::settings::ResolvedSettings;

/// State for one top-level invocation and every task it calls.
pub struct ExecutionContext<'a> {
    pub settings: ResolvedSettings,
    /// Name of the task that started the run, set by `tag_original`.
    pub called_task: Option<String>,
    pub remote: &'a dyn Shell,
    pub local: &'a dyn Shell,
    pub registry: &'a TaskRegistry,
    pub reporter: Reporter,
    running: Vec<String>,
    settings_shown: bool,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        settings: ResolvedSettings,
        remote: &'a dyn Shell,
        local: &'a dyn Shell,
        registry: &'a TaskRegistry,
        reporter: Reporter,
    ) -> Self {
        Self {
            settings,
            called_task: None,
            remote,
            local,
            registry,
            reporter,
            running: Vec::new(),
            settings_shown: false,
        }
    }

    /// Run a task by name or alias through its hook pipeline.
    ///
    /// A top-level call leaves the context as it found it: the entry-point
    /// tag, composite overrides and the settings-shown flag only live for
    /// that run.
    pub fn invoke(&mut self, name: &str, args: Args) -> Result<TaskOutcome> {
        if !self.running.is_empty() {
            return self.invoke_frame(name, args);
        }

        let called_task = self.called_task.clone();
        let settings = self.settings.clone();
        let settings_shown = self.settings_shown;

        let result = self.invoke_frame(name, args);

        self.called_task = called_task;
        self.settings = settings;
        self.settings_shown = settings_shown;
        self.running.clear();

        result
    }

    fn invoke_frame(&mut self, name: &str, args: Args) -> Result<TaskOutcome> {
        let registry = self.registry;
        let task = registry.get(name)?;

        let mut invocation = TaskInvocation {
            task: task.name.clone(),
            args,
        };

        for hook in &task.hooks {
            if let HookFlow::Skip(reason) = hook.apply(self, task, &mut invocation)? {
                return Ok(TaskOutcome::Skipped { reason });
            }
        }

        log_status!("task", "Running {}", task.name);
        self.running.push(task.name.clone());
        let result = (task.body)(self, &invocation.args);
        self.running.pop();

        result.map(|value| TaskOutcome::Ran { value })
    }

    /// Run a sub-task with no explicit arguments.
    pub fn call(&mut self, name: &str) -> Result<TaskOutcome> {
        self.invoke(name, Map::new())
    }

    pub fn call_with(&mut self, name: &str, args: Value) -> Result<TaskOutcome> {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.invoke(name, args)
    }

    /// True when `task` started this run, or nothing has been tagged yet.
    pub fn is_entry_point(&self, task: &str) -> bool {
        match &self.called_task {
            None => true,
            Some(tag) => tag == task,
        }
    }

    pub fn in_chain(&self, task: &str) -> bool {
        !self.is_entry_point(task)
    }

    /// The innermost task body currently running.
    pub fn current_task(&self) -> Option<&str> {
        self.running.last().map(String::as_str)
    }

    pub fn show_settings_once(&mut self) {
        if self.settings_shown {
            return;
        }
        self.settings_shown = true;
        render_settings(&self.settings, &mut self.reporter);
    }

    /// Run on the remote host; a non-zero exit is an error.
    pub fn run_remote(&self, command: ShellCommand) -> Result<CommandOutput> {
        let output = self.remote.run(&command);
        ensure_success(output, &command, self.remote.host(), self.current_task())
    }

    pub fn sudo_remote(&self, command: ShellCommand) -> Result<CommandOutput> {
        let command = command.with_sudo();
        let output = self.remote.run(&command);
        ensure_success(output, &command, self.remote.host(), self.current_task())
    }

    /// Run on the remote host and return whatever came back.
    pub fn probe_remote(&self, command: ShellCommand) -> CommandOutput {
        self.remote.run(&command)
    }

    pub fn run_local(&self, command: ShellCommand) -> Result<CommandOutput> {
        let output = self.local.run(&command);
        ensure_success(output, &command, self.local.host(), self.current_task())
    }
}
