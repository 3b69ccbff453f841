mod response;

pub use response::{exit_code_for_error, map_cmd_result_to_json, print_json_result};

use serde_json::Value;
use surge::report::Reporter;
use surge::{Error, ErrorCode};

/// Colored diagnostic for a failed run, naming what failed and why.
pub fn render_error(err: &Error, reporter: &mut Reporter) {
    reporter.error(format!("Error [{}]: {}", err.code.as_str(), err.message));

    let details = &err.details;
    match err.code {
        ErrorCode::GitWorkingTreeDirty => {
            for change in string_list(&details["changes"]) {
                reporter.plain(format!("  {}", change));
            }
        }
        ErrorCode::RemoteCommandFailed => {
            if let Some(command) = details["command"].as_str() {
                reporter.plain(format!("  command: {}", command));
            }
            if let Some(host) = details["target"]["host"].as_str() {
                reporter.plain(format!("  host: {}", host));
            }
            if let Some(stderr) = details["stderr"].as_str() {
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    reporter.plain(format!("  | {}", line));
                }
            }
        }
        ErrorCode::TaskNotFound => {
            let suggestions = string_list(&details["suggestions"]);
            if !suggestions.is_empty() {
                reporter.info(format!("Did you mean: {}?", suggestions.join(", ")));
            }
        }
        _ => {}
    }

    for hint in &err.hints {
        reporter.warning(format!("Hint: {}", hint.message));
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use surge::error::{RemoteCommandFailedDetails, TargetDetails};

    #[test]
    fn remote_failure_shows_command_and_stderr() {
        let err = Error::remote_command_failed(RemoteCommandFailedDetails {
            command: "cd '/srv/app' && git pull".to_string(),
            exit_code: 1,
            stdout: String::new(),
            stderr: "fatal: not a git repository\n".to_string(),
            target: TargetDetails {
                task: Some("pull".to_string()),
                host: Some("app.example.com".to_string()),
            },
        });

        let mut reporter = Reporter::captured();
        render_error(&err, &mut reporter);
        assert!(reporter.contains("remote.command_failed"));
        assert!(reporter.contains("command: cd '/srv/app' && git pull"));
        assert!(reporter.contains("| fatal: not a git repository"));
    }

    #[test]
    fn not_found_lists_suggestions() {
        let err = Error::task_not_found("bounse", vec!["bounce".to_string()]);
        let mut reporter = Reporter::captured();
        render_error(&err, &mut reporter);
        assert!(reporter.contains("Did you mean: bounce?"));
    }
}
