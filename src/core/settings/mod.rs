//! Layered deployment settings.
//!
//! Three layers merge into one flat mapping: compiled defaults, the declared
//! settings file, and per-invocation overrides. Keys are case-insensitive and
//! stored lowercase.

mod coerce;
mod defaults;
mod file;
mod merge;
mod resolver;
mod service_manager;

pub use coerce::{coerce_args, maybe_bool, value_as_bool, BoolFallback, BoolSelection, Unboolable};
pub use defaults::{DeployDefaults, DEFAULT_SSH_PORT, REQUIRED_KEYS};
pub use file::{load_settings_file, parse_settings};
pub use merge::{normalize_key, normalize_keys, recursive_update, MergeCondition, UpdateOptions};
pub use resolver::{resolve, DeploySettings, ResolvedSettings, SettingSource};
pub use service_manager::ServiceManager;
