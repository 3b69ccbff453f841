use serde_json::Value;

use super::{ExecutionContext, Task, TaskInvocation};
use crate::error::{Error, RequirementMissedDetails, Result};
use crate::settings::{coerce_args, maybe_bool, normalize_key, BoolFallback, BoolSelection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookFlow {
    Continue,
    /// Return without running the body.
    Skip(String),
}

/// One pre-invocation step. Hooks run in declared order; an error aborts the
/// invocation and a skip short-circuits it.
pub trait Hook {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        task: &Task,
        invocation: &mut TaskInvocation,
    ) -> Result<HookFlow>;
}

/// The pipeline most tasks share.
pub fn standard_hooks(bools: BoolSelection) -> Vec<Box<dyn Hook>> {
    vec![
        Box::new(TagOriginal),
        Box::new(OverrideSettings),
        Box::new(MergeOptions),
        Box::new(CoerceBools::strict(bools)),
        Box::new(ShowSettings),
    ]
}

/// Record the first task of the run as `called_task`.
pub struct TagOriginal;

impl Hook for TagOriginal {
    fn name(&self) -> &'static str {
        "tag_original"
    }

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        task: &Task,
        _invocation: &mut TaskInvocation,
    ) -> Result<HookFlow> {
        if ctx.called_task.is_none() {
            log_status!("task", "Entry point: {}", task.name);
            ctx.called_task = Some(task.name.clone());
        }
        Ok(HookFlow::Continue)
    }
}

/// Push a composite task's explicit arguments into the settings overrides.
pub struct OverrideSettings;

impl Hook for OverrideSettings {
    fn name(&self) -> &'static str {
        "override_settings"
    }

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        task: &Task,
        invocation: &mut TaskInvocation,
    ) -> Result<HookFlow> {
        if task.overrides_settings && !invocation.args.is_empty() {
            ctx.settings.update(&invocation.args)?;
        }
        Ok(HookFlow::Continue)
    }
}

/// Fill declared parameters the caller left unset from the settings.
pub struct MergeOptions;

impl Hook for MergeOptions {
    fn name(&self) -> &'static str {
        "merge_options"
    }

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        task: &Task,
        invocation: &mut TaskInvocation,
    ) -> Result<HookFlow> {
        for param in &task.params {
            let unset = matches!(invocation.args.get(param), None | Some(Value::Null));
            if !unset {
                continue;
            }
            if let Some(value) = ctx.settings.get(param) {
                invocation.args.insert(param.clone(), value.clone());
            }
        }
        Ok(HookFlow::Continue)
    }
}

/// Strictly coerce selected arguments to booleans.
pub struct CoerceBools {
    pub selection: BoolSelection,
    pub fallback: BoolFallback,
}

impl CoerceBools {
    pub fn strict(selection: BoolSelection) -> Self {
        Self {
            selection,
            fallback: BoolFallback::Raise,
        }
    }

    pub fn with_fallback(selection: BoolSelection, fallback: BoolFallback) -> Self {
        Self {
            selection,
            fallback,
        }
    }
}

impl Hook for CoerceBools {
    fn name(&self) -> &'static str {
        "try_bool"
    }

    fn apply(
        &self,
        _ctx: &mut ExecutionContext<'_>,
        _task: &Task,
        invocation: &mut TaskInvocation,
    ) -> Result<HookFlow> {
        coerce_args(&mut invocation.args, &self.selection, &self.fallback)?;
        Ok(HookFlow::Continue)
    }
}

/// Print the resolved settings once, when the task is the entry point.
pub struct ShowSettings;

impl Hook for ShowSettings {
    fn name(&self) -> &'static str {
        "show_settings"
    }

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        task: &Task,
        _invocation: &mut TaskInvocation,
    ) -> Result<HookFlow> {
        if ctx.is_entry_point(&task.name) {
            ctx.show_settings_once();
        }
        Ok(HookFlow::Continue)
    }
}

/// Look a guard setting up: explicit argument first, then the settings.
fn guard_value(ctx: &ExecutionContext<'_>, invocation: &TaskInvocation, setting: &str) -> Option<Value> {
    invocation
        .args
        .get(setting)
        .filter(|v| !v.is_null())
        .or_else(|| ctx.settings.get(setting))
        .cloned()
}

fn guard_matches(actual: Option<&Value>, expected: &Value) -> bool {
    let lenient = |v: &Value| maybe_bool(v, false).unwrap_or_else(|_| v.clone());
    match actual {
        Some(actual) => lenient(actual) == lenient(expected),
        None => false,
    }
}

/// Run the body only when `setting == value`.
///
/// A hard requirement fails the run on mismatch. A soft one skips the task,
/// printing a notice only when the task was invoked directly.
pub struct Require {
    pub setting: String,
    pub value: Value,
    pub error: bool,
}

impl Require {
    pub fn hard(setting: &str, value: impl Into<Value>) -> Self {
        Self {
            setting: normalize_key(setting),
            value: value.into(),
            error: true,
        }
    }

    pub fn soft(setting: &str, value: impl Into<Value>) -> Self {
        Self {
            setting: normalize_key(setting),
            value: value.into(),
            error: false,
        }
    }
}

impl Hook for Require {
    fn name(&self) -> &'static str {
        "require"
    }

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        task: &Task,
        invocation: &mut TaskInvocation,
    ) -> Result<HookFlow> {
        let actual = guard_value(ctx, invocation, &self.setting);
        if guard_matches(actual.as_ref(), &self.value) {
            return Ok(HookFlow::Continue);
        }

        if self.error {
            return Err(Error::requirement_missed(RequirementMissedDetails {
                task: task.name.clone(),
                setting: self.setting.clone(),
                expected: self.value.clone(),
                actual,
            }));
        }

        if ctx.called_task.is_none() {
            return Err(Error::task_untagged(task.name.clone()));
        }

        let reason = format!(
            "{} skipped: {} is not {}",
            task.name,
            self.setting.to_uppercase(),
            self.value
        );
        if ctx.is_entry_point(&task.name) {
            ctx.reporter.warning(reason.clone());
        }
        log_status!("task", "{}", reason);
        Ok(HookFlow::Skip(reason))
    }
}

/// Inside a chain, skip the task unless `setting == value`. Direct
/// invocations always run.
pub struct SkipIfNot {
    pub setting: String,
    pub value: Value,
}

impl SkipIfNot {
    pub fn new(setting: &str, value: impl Into<Value>) -> Self {
        Self {
            setting: normalize_key(setting),
            value: value.into(),
        }
    }
}

impl Hook for SkipIfNot {
    fn name(&self) -> &'static str {
        "skip_if_not"
    }

    fn apply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        task: &Task,
        invocation: &mut TaskInvocation,
    ) -> Result<HookFlow> {
        if !ctx.in_chain(&task.name) {
            return Ok(HookFlow::Continue);
        }

        let actual = guard_value(ctx, invocation, &self.setting);
        if guard_matches(actual.as_ref(), &self.value) {
            Ok(HookFlow::Continue)
        } else {
            Ok(HookFlow::Skip(format!(
                "{} skipped in chain: {} is not {}",
                task.name,
                self.setting.to_uppercase(),
                self.value
            )))
        }
    }
}
