use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Decides whether `key` from `other` may overwrite `base`.
pub type MergeCondition<'a> = dyn Fn(&str, &Map<String, Value>, &Map<String, Value>) -> bool + 'a;

/// Knobs for [`recursive_update`].
#[derive(Default)]
pub struct UpdateOptions<'a> {
    /// Never overwrite an existing non-mapping value.
    pub preserve: bool,
    /// Allow a mapping to replace an existing non-mapping value.
    pub obliterate: bool,
    /// Only update keys already present in the base.
    pub mask: bool,
    pub condition: Option<&'a MergeCondition<'a>>,
}

enum Step {
    Recurse,
    Assign,
    Keep,
}

/// Merge `other` into `base`, descending into nested mappings.
///
/// Scalars and lists are replaced wholesale. A mapping arriving over an
/// existing scalar is `config.type_mismatch` unless `obliterate` is set.
pub fn recursive_update(
    base: &mut Map<String, Value>,
    other: &Map<String, Value>,
    options: &UpdateOptions<'_>,
) -> Result<()> {
    for (key, value) in other {
        let step = match (base.get(key), value) {
            (Some(Value::Object(_)), Value::Object(_)) => Step::Recurse,
            (Some(_), Value::Object(_)) if options.obliterate => Step::Assign,
            (Some(_), Value::Object(_)) => return Err(Error::config_type_mismatch(key.clone())),
            (Some(_), _) if options.preserve => Step::Keep,
            (Some(_), _) => Step::Assign,
            (None, _) if options.mask => Step::Keep,
            (None, _) => Step::Assign,
        };

        match step {
            Step::Recurse => {
                if let (Some(Value::Object(inner)), Value::Object(patch)) = (base.get_mut(key), value)
                {
                    recursive_update(inner, patch, options)?;
                }
            }
            Step::Assign => {
                let allowed = options
                    .condition
                    .map(|condition| condition(key, base, other))
                    .unwrap_or(true);
                if allowed {
                    base.insert(key.clone(), value.clone());
                }
            }
            Step::Keep => {}
        }
    }

    Ok(())
}

/// Lowercase every key, descending into nested mappings.
pub fn normalize_keys(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (normalize_key(k), normalize_value(v)))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(inner) => Value::Object(normalize_keys(inner)),
        other => other.clone(),
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
