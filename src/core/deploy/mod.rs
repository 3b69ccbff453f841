//! The deployment task set.
//!
//! Leaf tasks each wrap a handful of remote commands. Composite tasks
//! (`full_pull`, `full_deploy`, `full_deploy_with_migrate`) sequence them.

mod checks;
mod cron;
mod django;
mod git;
mod permissions;
mod sequence;
mod services;

pub use sequence::{DeployStage, StageReport, StageStatus};
pub use services::{parse_status, ServiceStatus};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::settings::{value_as_bool, BoolFallback};
use crate::task::{Args, TaskRegistry};

/// Build the registry of every deployment task.
pub fn namespace() -> Result<TaskRegistry> {
    let mut registry = TaskRegistry::new();
    checks::register(&mut registry)?;
    permissions::register(&mut registry)?;
    git::register(&mut registry)?;
    django::register(&mut registry)?;
    services::register(&mut registry)?;
    cron::register(&mut registry)?;
    sequence::register(&mut registry)?;
    Ok(registry)
}

pub(crate) fn required_arg(args: &Args, key: &str) -> Result<String> {
    match args.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            Err(Error::config_missing_keys(vec![key.to_uppercase()]))
        }
        Some(other) => Err(Error::config_invalid_value(
            key,
            Some(other.to_string()),
            "expected a string",
        )),
    }
}

pub(crate) fn optional_arg(args: &Args, key: &str) -> Result<Option<String>> {
    match args.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(other) => Err(Error::config_invalid_value(
            key,
            Some(other.to_string()),
            "expected a string",
        )),
    }
}

pub(crate) fn flag(args: &Args, key: &str) -> Result<bool> {
    value_as_bool(key, args.get(key), &BoolFallback::Raise)
}

/// A list of strings; a comma-separated string is accepted too.
pub(crate) fn list_arg(args: &Args, key: &str) -> Result<Vec<String>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(Error::config_invalid_value(
                    key,
                    Some(other.to_string()),
                    "expected a list of strings",
                )),
            })
            .collect(),
        Some(other) => Err(Error::config_invalid_value(
            key,
            Some(other.to_string()),
            "expected a list of strings",
        )),
    }
}
