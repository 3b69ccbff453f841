use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,
    ConfigTypeMismatch,

    ValidationInvalidArgument,
    ValidationUnboolable,

    TaskNotFound,
    TaskRequirementMissed,
    TaskUntagged,

    SshIdentityFileNotFound,

    RemoteCommandFailed,

    GitWorkingTreeDirty,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",
            ErrorCode::ConfigTypeMismatch => "config.type_mismatch",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationUnboolable => "validation.unboolable",

            ErrorCode::TaskNotFound => "task.not_found",
            ErrorCode::TaskRequirementMissed => "task.requirement_missed",
            ErrorCode::TaskUntagged => "task.untagged",

            ErrorCode::SshIdentityFileNotFound => "ssh.identity_file_not_found",

            ErrorCode::RemoteCommandFailed => "remote.command_failed",

            ErrorCode::GitWorkingTreeDirty => "git.working_tree_dirty",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeysDetails {
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnboolableDetails {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementMissedDetails {
    pub task: String,
    pub setting: String,
    pub expected: Value,
    /// `None` when the setting is absent from the resolved configuration.
    pub actual: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub target: TargetDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingTreeDirtyDetails {
    /// `local` or `remote`.
    pub location: String,
    pub path: String,
    pub changes: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    /// All missing required keys are reported together, upper-cased.
    pub fn config_missing_keys(keys: Vec<String>) -> Self {
        Self::config_required_keys(keys, Vec::new())
    }

    /// Required settings that are absent (`keys`) or set to a non-string (`invalid`).
    pub fn config_required_keys(keys: Vec<String>, invalid: Vec<String>) -> Self {
        let mut problems = Vec::new();
        if !keys.is_empty() {
            problems.push(format!("missing: {}", keys.join(", ")));
        }
        if !invalid.is_empty() {
            problems.push(format!("not strings: {}", invalid.join(", ")));
        }
        let message = format!("Required settings are {}", problems.join("; "));
        Self::new(
            ErrorCode::ConfigMissingKey,
            message,
            to_details(ConfigMissingKeysDetails { keys, invalid }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let path = path.into();
        Self::new(
            ErrorCode::ConfigInvalidJson,
            format!("Invalid JSON in settings file {}", path),
            to_details(ConfigInvalidJsonDetails {
                path,
                error: err.to_string(),
            }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid setting {}: {}", key.to_uppercase(), problem),
            to_details(ConfigInvalidValueDetails {
                key,
                value,
                problem,
            }),
        )
    }

    pub fn config_type_mismatch(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(
            ErrorCode::ConfigTypeMismatch,
            format!("Cannot overwrite non-mapping with mapping at {}", key),
            serde_json::json!({ "key": key }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            problem.clone(),
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem,
                tried,
            }),
        )
    }

    pub fn unboolable(name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::ValidationUnboolable,
            format!("Value for '{}' is not a boolean: {}", name, value),
            to_details(UnboolableDetails { name, value }),
        )
    }

    pub fn task_not_found(id: impl Into<String>, suggestions: Vec<String>) -> Self {
        let id = id.into();
        let err = Self::new(
            ErrorCode::TaskNotFound,
            format!("No task named '{}'", id),
            to_details(NotFoundDetails {
                id,
                suggestions: suggestions.clone(),
            }),
        );
        if suggestions.is_empty() {
            err.with_hint("Run 'surge list' to see available tasks")
        } else {
            err.with_hint(format!("Did you mean: {}", suggestions.join(", ")))
        }
    }

    pub fn requirement_missed(details: RequirementMissedDetails) -> Self {
        let actual = details
            .actual
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "<unset>".to_string());
        let message = format!(
            "Task '{}' requires {} = {} (found {})",
            details.task,
            details.setting.to_uppercase(),
            details.expected,
            actual
        );
        Self::new(
            ErrorCode::TaskRequirementMissed,
            message,
            to_details(details),
        )
    }

    pub fn task_untagged(task: impl Into<String>) -> Self {
        let task = task.into();
        Self::new(
            ErrorCode::TaskUntagged,
            format!("Task '{}' ran without a called_task tag", task),
            serde_json::json!({ "task": task }),
        )
    }

    pub fn ssh_identity_file_not_found(identity_file: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SshIdentityFileNotFound,
            "SSH identity file not found",
            serde_json::json!({ "identityFile": identity_file.into() }),
        )
    }

    pub fn remote_command_failed(details: RemoteCommandFailedDetails) -> Self {
        let message = format!(
            "Command failed (exit {}): {}",
            details.exit_code, details.command
        );
        Self::new(
            ErrorCode::RemoteCommandFailed,
            message,
            to_details(details),
        )
    }

    pub fn working_tree_dirty(details: WorkingTreeDirtyDetails) -> Self {
        let message = if details.location == "local" {
            "Your working directory is not clean.".to_string()
        } else {
            format!("Remote working directory is not clean: {}", details.path)
        };
        Self::new(
            ErrorCode::GitWorkingTreeDirty,
            message,
            to_details(details),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}
