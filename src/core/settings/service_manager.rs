use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// Init system used to query and restart services on the remote host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceManager {
    Upstart,
    Systemd,
}

impl ServiceManager {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "upstart" => Ok(ServiceManager::Upstart),
            "systemd" => Ok(ServiceManager::Systemd),
            _ => Err(Error::config_invalid_value(
                "os_service_manager",
                Some(raw.to_string()),
                "expected 'upstart' or 'systemd'",
            )),
        }
    }

    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            Some(Value::String(s)) => Self::parse(s),
            Some(other) => Err(Error::config_invalid_value(
                "os_service_manager",
                Some(other.to_string()),
                "expected 'upstart' or 'systemd'",
            )),
            None => Err(Error::config_missing_keys(vec![
                "OS_SERVICE_MANAGER".to_string()
            ])),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceManager::Upstart => "upstart",
            ServiceManager::Systemd => "systemd",
        }
    }
}

impl fmt::Display for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
