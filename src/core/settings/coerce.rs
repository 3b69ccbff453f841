//! Boolean coercion for setting and argument values.
//!
//! Settings files and CLI flags frequently carry booleans as strings
//! (`"yes"`, `"False"`). `maybe_bool` turns those into real booleans and
//! leaves every other value alone, or rejects it when asked to be strict.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// A string that does not spell a boolean, rejected by strict coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unboolable {
    pub value: String,
}

impl fmt::Display for Unboolable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a boolean", self.value)
    }
}

impl std::error::Error for Unboolable {}

fn parse_bool_str(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Coerce a boolean-looking string into a JSON boolean.
///
/// Non-string values pass through untouched. Strings that are not one of
/// `true`/`yes`/`false`/`no` (any case) are an error when `strict`, otherwise
/// returned unchanged.
pub fn maybe_bool(value: &Value, strict: bool) -> std::result::Result<Value, Unboolable> {
    match value {
        Value::String(s) => match parse_bool_str(s) {
            Some(b) => Ok(Value::Bool(b)),
            None if strict => Err(Unboolable { value: s.clone() }),
            None => Ok(value.clone()),
        },
        other => Ok(other.clone()),
    }
}

/// Which arguments a coercion pass touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoolSelection {
    All,
    None,
    Only(Vec<String>),
}

impl BoolSelection {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BoolSelection::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn selects(&self, name: &str) -> bool {
        match self {
            BoolSelection::All => true,
            BoolSelection::None => false,
            BoolSelection::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

/// What a strict coercion does with a value it cannot turn into a boolean.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolFallback {
    /// Propagate `validation.unboolable`.
    Raise,
    /// Substitute one value for every argument.
    Default(Value),
    /// Substitute a per-argument value; arguments without an entry raise.
    PerArgument(BTreeMap<String, Value>),
}

impl BoolFallback {
    pub fn resolve(&self, name: &str, value: &Value) -> Result<Value> {
        match self {
            BoolFallback::Raise => Err(Error::unboolable(name, value.clone())),
            BoolFallback::Default(default) => Ok(default.clone()),
            BoolFallback::PerArgument(defaults) => defaults
                .get(name)
                .cloned()
                .ok_or_else(|| Error::unboolable(name, value.clone())),
        }
    }
}

/// Strictly coerce the selected entries of `args` in place.
pub fn coerce_args(
    args: &mut Map<String, Value>,
    selection: &BoolSelection,
    fallback: &BoolFallback,
) -> Result<()> {
    for (name, value) in args.iter_mut() {
        if !selection.selects(name) {
            continue;
        }
        *value = match maybe_bool(value, true) {
            Ok(coerced) => coerced,
            Err(_) => fallback.resolve(name, value)?,
        };
    }
    Ok(())
}

/// Read a value as a boolean: missing and `null` are false, real booleans
/// and boolean strings are themselves, anything else goes to `fallback`.
pub fn value_as_bool(name: &str, value: Option<&Value>, fallback: &BoolFallback) -> Result<bool> {
    let value = match value {
        None | Some(Value::Null) => return Ok(false),
        Some(v) => v,
    };

    let coerced = match maybe_bool(value, true) {
        Ok(v) => v,
        Err(_) => fallback.resolve(name, value)?,
    };

    match coerced {
        Value::Bool(b) => Ok(b),
        other => Err(Error::unboolable(name, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthy_strings_any_case() {
        for s in ["true", "yes", "TRUE", "Yes"] {
            assert_eq!(maybe_bool(&json!(s), true), Ok(json!(true)));
        }
    }

    #[test]
    fn falsy_strings_any_case() {
        for s in ["false", "no", "FALSE", "No"] {
            assert_eq!(maybe_bool(&json!(s), true), Ok(json!(false)));
        }
    }

    #[test]
    fn other_strings_depend_on_strictness() {
        assert_eq!(
            maybe_bool(&json!("maybe"), true),
            Err(Unboolable {
                value: "maybe".to_string()
            })
        );
        assert_eq!(maybe_bool(&json!("maybe"), false), Ok(json!("maybe")));
    }

    #[test]
    fn non_strings_pass_through() {
        assert_eq!(maybe_bool(&json!(1), true), Ok(json!(1)));
        assert_eq!(maybe_bool(&json!(["yes"]), true), Ok(json!(["yes"])));
        assert_eq!(maybe_bool(&Value::Null, true), Ok(Value::Null));
    }

    #[test]
    fn coerce_args_only_touches_selection() {
        let mut args = json!({"restart": "yes", "path": "/srv/app"})
            .as_object()
            .cloned()
            .unwrap();
        coerce_args(
            &mut args,
            &BoolSelection::only(["restart"]),
            &BoolFallback::Raise,
        )
        .unwrap();
        assert_eq!(args["restart"], json!(true));
        assert_eq!(args["path"], json!("/srv/app"));
    }

    #[test]
    fn coerce_args_raise_fallback_errors() {
        let mut args = json!({"path": "/srv/app"}).as_object().cloned().unwrap();
        let err = coerce_args(&mut args, &BoolSelection::All, &BoolFallback::Raise).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.unboolable");
        assert_eq!(err.details["name"], json!("path"));
    }

    #[test]
    fn coerce_args_default_fallback_substitutes() {
        let mut args = json!({"a": "nope", "b": "no"}).as_object().cloned().unwrap();
        coerce_args(
            &mut args,
            &BoolSelection::All,
            &BoolFallback::Default(json!(false)),
        )
        .unwrap();
        assert_eq!(args["a"], json!(false));
        assert_eq!(args["b"], json!(false));
    }

    #[test]
    fn coerce_args_per_argument_fallback() {
        let mut defaults = BTreeMap::new();
        defaults.insert("a".to_string(), json!(true));
        let fallback = BoolFallback::PerArgument(defaults);

        let mut args = json!({"a": "nope"}).as_object().cloned().unwrap();
        coerce_args(&mut args, &BoolSelection::All, &fallback).unwrap();
        assert_eq!(args["a"], json!(true));

        let mut args = json!({"b": "nope"}).as_object().cloned().unwrap();
        assert!(coerce_args(&mut args, &BoolSelection::All, &fallback).is_err());
    }

    #[test]
    fn selection_none_is_a_no_op() {
        let mut args = json!({"a": "yes"}).as_object().cloned().unwrap();
        coerce_args(&mut args, &BoolSelection::None, &BoolFallback::Raise).unwrap();
        assert_eq!(args["a"], json!("yes"));
    }

    #[test]
    fn value_as_bool_treats_missing_as_false() {
        assert!(!value_as_bool("x", None, &BoolFallback::Raise).unwrap());
        assert!(!value_as_bool("x", Some(&Value::Null), &BoolFallback::Raise).unwrap());
        assert!(value_as_bool("x", Some(&json!("Yes")), &BoolFallback::Raise).unwrap());
        assert!(value_as_bool("x", Some(&json!(3)), &BoolFallback::Raise).is_err());
    }
}
