use serde_json::{json, Map, Value};

use surge::settings::normalize_key;

pub type CmdResult<T> = surge::Result<(T, i32)>;

/// Flags accepted before the task name.
#[derive(Debug, Default, Clone)]
pub(crate) struct GlobalArgs {
    pub settings: Option<String>,
    pub set: Vec<String>,
    pub dry_run: bool,
    pub json: bool,
}

// ============================================================================
// Flag parsing (CLI layer)
// ============================================================================

/// Parse trailing `--key value` (or `--key=value`) task flags into arguments.
///
/// Dashes in flag names become underscores so `--require-clean` and
/// `--require_clean` name the same setting.
pub(crate) fn parse_kv_flags(extra: &[String]) -> surge::Result<Map<String, Value>> {
    let mut obj = Map::new();
    let mut iter = extra.iter();

    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            return Err(surge::Error::validation_invalid_argument(
                arg.as_str(),
                format!("Unexpected argument '{}'; task options are --key value", arg),
                None,
            ));
        };

        let (key, raw) = match flag.split_once('=') {
            Some((key, raw)) => (key, raw.to_string()),
            None => {
                let raw = iter.next().ok_or_else(|| {
                    surge::Error::validation_invalid_argument(
                        flag,
                        format!("Missing value for flag --{}", flag),
                        None,
                    )
                })?;
                (flag, raw.clone())
            }
        };

        obj.insert(normalize_key(&key.replace('-', "_")), parse_value(&raw));
    }

    Ok(obj)
}

/// Parse repeated `--set KEY=VALUE` overrides.
pub(crate) fn parse_set_overrides(pairs: &[String]) -> surge::Result<Map<String, Value>> {
    let mut obj = Map::new();
    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            surge::Error::validation_invalid_argument(
                "set",
                format!("Expected KEY=VALUE, got '{}'", pair),
                None,
            )
        })?;
        if key.trim().is_empty() {
            return Err(surge::Error::validation_invalid_argument(
                "set",
                format!("Empty key in '{}'", pair),
                None,
            ));
        }
        obj.insert(normalize_key(key), parse_value(raw));
    }
    Ok(obj)
}

/// Parse a string value into appropriate JSON type.
/// Order: JSON literal → bool → number → string
pub(crate) fn parse_value(s: &str) -> Value {
    // Try JSON first (handles arrays, objects, quoted strings)
    if let Ok(v) = serde_json::from_str(s) {
        return v;
    }
    if s == "true" {
        return json!(true);
    }
    if s == "false" {
        return json!(false);
    }
    if let Ok(n) = s.parse::<i64>() {
        return json!(n);
    }
    if let Ok(n) = s.parse::<f64>() {
        return json!(n);
    }
    json!(s)
}

pub mod list;
pub mod run;

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn kv_flags_accept_both_forms() {
        let parsed =
            parse_kv_flags(&strings(&["--require-clean", "false", "--BRANCH_NAME=release"])).unwrap();
        assert_eq!(parsed["require_clean"], json!(false));
        assert_eq!(parsed["branch_name"], json!("release"));
    }

    #[test]
    fn kv_flags_reject_dangling_flag() {
        let err = parse_kv_flags(&strings(&["--skip_migrate"])).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn kv_flags_reject_positional_values() {
        assert!(parse_kv_flags(&strings(&["web"])).is_err());
    }

    #[test]
    fn set_overrides_parse_json_values() {
        let parsed = parse_set_overrides(&strings(&[
            "BOUNCE_SERVICES=[\"web\",\"worker\"]",
            "port=2222",
            "deploy_path=/srv/app",
        ]))
        .unwrap();
        assert_eq!(parsed["bounce_services"], json!(["web", "worker"]));
        assert_eq!(parsed["port"], json!(2222));
        assert_eq!(parsed["deploy_path"], json!("/srv/app"));
    }

    #[test]
    fn set_overrides_need_equals() {
        assert!(parse_set_overrides(&strings(&["host"])).is_err());
        assert!(parse_set_overrides(&strings(&["=x"])).is_err());
    }

    #[test]
    fn parse_value_order() {
        assert_eq!(parse_value("yes"), json!("yes"));
        assert_eq!(parse_value("1.5"), json!(1.5));
        assert_eq!(parse_value("\"8\""), json!("8"));
        assert_eq!(parse_value("{\"a\":1}"), json!({"a": 1}));
    }
}
