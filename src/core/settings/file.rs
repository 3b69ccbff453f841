use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Error, Result};

/// Read the declared settings layer from a JSON object on disk.
pub fn load_settings_file(path: &Path) -> Result<Map<String, Value>> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", display))))?;

    parse_settings(&raw, &display)
}

pub fn parse_settings(raw: &str, origin: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Error::config_invalid_json(origin, e))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::config_invalid_value(
            "settings",
            Some(origin.to_string()),
            format!("expected a JSON object, found {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
