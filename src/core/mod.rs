// Public modules
pub mod deploy;
pub mod error;
pub mod remote;
pub mod report;
pub mod settings;
pub mod task;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use paths::{settings_file, SettingsPath, SETTINGS_ENV};
