//! Named tasks and the hook pipeline that runs in front of them.
//!
//! A task is invoked either directly (the entry point of a run) or by another
//! task as one step of a chain. The `called_task` tag on the
//! [`ExecutionContext`] tells the two apart: it is set by the first task to
//! run and never overwritten. Guards, settings display and skip notices all
//! key off it.

mod context;
mod display;
mod hooks;
mod registry;

pub use context::ExecutionContext;
pub use display::render_settings;
pub use hooks::{
    standard_hooks, CoerceBools, Hook, HookFlow, MergeOptions, OverrideSettings, Require,
    ShowSettings, SkipIfNot, TagOriginal,
};
pub use registry::{TaskRegistry, TaskSummary};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::settings::BoolSelection;

/// Keyword arguments of a task invocation, keyed by setting name.
pub type Args = Map<String, Value>;

pub type TaskBody = fn(&mut ExecutionContext<'_>, &Args) -> Result<Value>;

/// The task being invoked and the arguments it will receive.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInvocation {
    pub task: String,
    pub args: Args,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Ran { value: Value },
    Skipped { reason: String },
}

impl TaskOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskOutcome::Skipped { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            TaskOutcome::Ran { value } => Some(value),
            TaskOutcome::Skipped { .. } => None,
        }
    }
}

pub struct Task {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    /// Settings the body reads from its arguments.
    pub params: Vec<String>,
    pub hooks: Vec<Box<dyn Hook>>,
    pub body: TaskBody,
    pub is_default: bool,
    /// Explicit arguments become setting overrides for the rest of the chain.
    pub overrides_settings: bool,
}

impl Task {
    pub fn new(name: impl Into<String>, body: TaskBody) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            help: String::new(),
            params: Vec::new(),
            hooks: Vec::new(),
            body,
            is_default: false,
            overrides_settings: false,
        }
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = text.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Tag, override, merge, coerce `bools`, show settings.
    pub fn with_standard_hooks(mut self, bools: BoolSelection) -> Self {
        self.hooks.extend(standard_hooks(bools));
        self
    }

    pub fn default_task(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn composite(mut self) -> Self {
        self.overrides_settings = true;
        self
    }

    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }
}
