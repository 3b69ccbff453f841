use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Compiled-in deployment defaults, the lowest configuration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployDefaults {
    #[serde(default = "default_true")]
    pub require_clean: bool,

    #[serde(default = "default_true")]
    pub require_remote_clean: bool,

    #[serde(default = "default_branch_name")]
    pub branch_name: String,

    #[serde(default = "default_true")]
    pub django_project: bool,

    #[serde(default)]
    pub skip_syncdb: bool,

    #[serde(default)]
    pub skip_migrate: bool,

    #[serde(default)]
    pub restart_nginx: bool,

    #[serde(default)]
    pub bounce_services_only_if_running: bool,

    #[serde(default = "default_os_service_manager")]
    pub os_service_manager: String,
}

impl Default for DeployDefaults {
    fn default() -> Self {
        Self {
            require_clean: default_true(),
            require_remote_clean: default_true(),
            branch_name: default_branch_name(),
            django_project: default_true(),
            skip_syncdb: false,
            skip_migrate: false,
            restart_nginx: false,
            bounce_services_only_if_running: false,
            os_service_manager: default_os_service_manager(),
        }
    }
}

impl DeployDefaults {
    /// Flatten into the settings mapping used by the resolver.
    pub fn to_settings(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_branch_name() -> String {
    "master".to_string()
}

fn default_os_service_manager() -> String {
    "upstart".to_string()
}

/// Required settings, in the order they are reported when missing.
pub const REQUIRED_KEYS: &[&str] = &["host", "user", "group", "deploy_path"];

pub const DEFAULT_SSH_PORT: u16 = 22;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_flatten_to_lowercase_settings() {
        let settings = DeployDefaults::default().to_settings();
        assert_eq!(settings["require_clean"], json!(true));
        assert_eq!(settings["branch_name"], json!("master"));
        assert_eq!(settings["os_service_manager"], json!("upstart"));
        assert_eq!(settings["skip_migrate"], json!(false));
        assert_eq!(settings.len(), 9);
    }

    #[test]
    fn partial_defaults_fill_from_default_fns() {
        let parsed: DeployDefaults = serde_json::from_str(r#"{"branch_name": "main"}"#).unwrap();
        assert_eq!(parsed.branch_name, "main");
        assert!(parsed.require_clean);
        assert_eq!(parsed.os_service_manager, "upstart");
    }
}
