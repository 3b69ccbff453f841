use serde::Serialize;
use serde_json::{Map, Value};

use super::coerce::{value_as_bool, BoolFallback};
use super::defaults::{DEFAULT_SSH_PORT, REQUIRED_KEYS};
use super::merge::{normalize_key, normalize_keys, recursive_update, UpdateOptions};
use super::service_manager::ServiceManager;
use crate::error::{Error, Result};

/// Where a resolved setting's value came from, relative to the compiled defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingSource {
    Default,
    OverriddenDefault,
    Configured,
}

impl SettingSource {
    pub fn label(&self) -> &'static str {
        match self {
            SettingSource::Default => "Default",
            SettingSource::OverriddenDefault => "Overridden Default",
            SettingSource::Configured => "Configured",
        }
    }
}

/// Typed view of the settings every deployment needs.
#[derive(Debug, Clone, Serialize)]
pub struct DeploySettings {
    pub host: String,
    pub user: String,
    pub group: String,
    pub deploy_path: String,
    pub port: u16,
    pub identity_file: Option<String>,
    pub branch_name: String,
    pub os_service_manager: ServiceManager,
    pub chown_target: String,
    pub crontab_owner: String,
    pub git_tree: String,
}

/// The merged configuration: `defaults < declared < overrides`, plus derived keys.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    defaults: Map<String, Value>,
    declared: Map<String, Value>,
    overrides: Map<String, Value>,
    merged: Map<String, Value>,
    crontab_owner: Option<String>,
    deploy: DeploySettings,
}

/// Merge the three layers, derive computed keys and validate the result.
pub fn resolve(
    defaults: &Map<String, Value>,
    declared: &Map<String, Value>,
    overrides: &Map<String, Value>,
) -> Result<ResolvedSettings> {
    let defaults = normalize_keys(defaults);
    let declared = normalize_keys(declared);
    let overrides = normalize_keys(overrides);

    let (merged, crontab_owner, deploy) = build(&defaults, &declared, &overrides, None)?;

    log_status!("settings", "Resolved {} settings for {}", merged.len(), deploy.host);

    Ok(ResolvedSettings {
        defaults,
        declared,
        overrides,
        merged,
        crontab_owner,
        deploy,
    })
}

type Built = (Map<String, Value>, Option<String>, DeploySettings);

fn build(
    defaults: &Map<String, Value>,
    declared: &Map<String, Value>,
    overrides: &Map<String, Value>,
    previous_crontab_owner: Option<&str>,
) -> Result<Built> {
    let options = UpdateOptions::default();
    let mut merged = defaults.clone();
    recursive_update(&mut merged, declared, &options)?;
    recursive_update(&mut merged, overrides, &options)?;

    validate_required(&merged)?;

    let user = required_str(&merged, "user")?;
    let group = required_str(&merged, "group")?;
    let deploy_path = required_str(&merged, "deploy_path")?;

    if !is_set(&merged, "chown_target") {
        merged.insert(
            "chown_target".to_string(),
            Value::String(format!("{}:{}", user, group)),
        );
    }

    let explicit_owner = is_set(declared, "crontab_owner") || is_set(overrides, "crontab_owner");
    if !explicit_owner {
        let owner = previous_crontab_owner.unwrap_or(user.as_str()).to_string();
        merged.insert("crontab_owner".to_string(), Value::String(owner));
    }

    if !is_set(&merged, "git_tree") {
        merged.insert("git_tree".to_string(), Value::String(deploy_path.clone()));
    }

    let deploy = DeploySettings {
        host: required_str(&merged, "host")?,
        user,
        group,
        deploy_path,
        port: parse_port(merged.get("port"))?,
        identity_file: optional_str(&merged, "identity_file")?,
        branch_name: optional_str(&merged, "branch_name")?.unwrap_or_else(|| "master".to_string()),
        os_service_manager: ServiceManager::from_value(merged.get("os_service_manager"))?,
        chown_target: required_str(&merged, "chown_target")?,
        crontab_owner: required_str(&merged, "crontab_owner")?,
        git_tree: required_str(&merged, "git_tree")?,
    };

    let crontab_owner = Some(deploy.crontab_owner.clone());
    Ok((merged, crontab_owner, deploy))
}

fn is_set(map: &Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn validate_required(merged: &Map<String, Value>) -> Result<()> {
    let mut missing = Vec::new();
    let mut invalid = Vec::new();
    for key in REQUIRED_KEYS {
        match merged.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => {}
            None | Some(Value::Null) | Some(Value::String(_)) => missing.push(key.to_uppercase()),
            Some(_) => invalid.push(key.to_uppercase()),
        }
    }

    if missing.is_empty() && invalid.is_empty() {
        Ok(())
    } else {
        Err(Error::config_required_keys(missing, invalid)
            .with_hint("Set them as strings in surge.json or pass --set KEY=VALUE"))
    }
}

fn required_str(map: &Map<String, Value>, key: &str) -> Result<String> {
    match map.get(key) {
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

fn optional_str(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(other) => Err(Error::config_invalid_value(
            key,
            Some(other.to_string()),
            "expected a string",
        )),
    }
}

fn parse_port(value: Option<&Value>) -> Result<u16> {
    let invalid = |raw: String| Error::config_invalid_value("port", Some(raw), "expected a port number");
    match value {
        None | Some(Value::Null) => Ok(DEFAULT_SSH_PORT),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| invalid(n.to_string())),
        Some(Value::String(s)) => s.trim().parse::<u16>().map_err(|_| invalid(s.clone())),
        Some(other) => Err(invalid(other.to_string())),
    }
}

impl ResolvedSettings {
    /// Value fixed at the last merge.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.merged.get(&normalize_key(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Read a setting as a boolean, coercing boolean-looking strings.
    pub fn get_bool(&self, key: &str, fallback: &BoolFallback) -> Result<bool> {
        let key = normalize_key(key);
        value_as_bool(&key, self.merged.get(&key), fallback)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.merged.contains_key(&normalize_key(key))
    }

    /// Merge another override layer on top and re-derive.
    ///
    /// Nothing changes if the merge or validation fails.
    pub fn update(&mut self, overrides: &Map<String, Value>) -> Result<()> {
        let incoming = normalize_keys(overrides);
        if incoming.is_empty() {
            return Ok(());
        }

        let mut layered = self.overrides.clone();
        recursive_update(&mut layered, &incoming, &UpdateOptions::default())?;

        let (merged, crontab_owner, deploy) = build(
            &self.defaults,
            &self.declared,
            &layered,
            self.crontab_owner.as_deref(),
        )?;

        log_status!(
            "settings",
            "Applied overrides: {}",
            incoming.keys().cloned().collect::<Vec<_>>().join(", ")
        );

        self.overrides = layered;
        self.merged = merged;
        self.crontab_owner = crontab_owner;
        self.deploy = deploy;
        Ok(())
    }

    pub fn deploy(&self) -> &DeploySettings {
        &self.deploy
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.merged
    }

    pub fn source(&self, key: &str) -> SettingSource {
        let key = normalize_key(key);
        match (self.defaults.get(&key), self.merged.get(&key)) {
            (Some(default), Some(value)) if default == value => SettingSource::Default,
            (Some(_), _) => SettingSource::OverriddenDefault,
            (None, _) => SettingSource::Configured,
        }
    }

    /// Every setting sorted by key with its provenance.
    pub fn entries(&self) -> Vec<(&str, &Value, SettingSource)> {
        let mut entries: Vec<_> = self
            .merged
            .iter()
            .map(|(k, v)| (k.as_str(), v, self.source(k)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
