use std::env;
use std::path::PathBuf;

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "SURGE_SETTINGS";

/// Settings file looked up in the working directory when nothing else is given.
pub const DEFAULT_SETTINGS_FILE: &str = "surge.json";

/// A settings file location and whether the operator asked for it by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPath {
    pub path: PathBuf,
    /// An explicit path must exist; the implicit `./surge.json` may be absent.
    pub explicit: bool,
}

/// Resolve the settings file: `--settings` > `SURGE_SETTINGS` > `./surge.json`.
pub fn settings_file(flag: Option<&str>) -> SettingsPath {
    settings_file_from(flag, env::var(SETTINGS_ENV).ok())
}

pub fn settings_file_from(flag: Option<&str>, env_value: Option<String>) -> SettingsPath {
    let named = flag
        .map(str::to_string)
        .or(env_value)
        .filter(|p| !p.trim().is_empty());

    match named {
        Some(path) => SettingsPath {
            path: PathBuf::from(shellexpand::tilde(&path).to_string()),
            explicit: true,
        },
        None => SettingsPath {
            path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            explicit: false,
        },
    }
}
