use serde::Serialize;
use serde_json::{Map, Value};

use surge::deploy;
use surge::remote::{LocalShell, RecordedCommand, RecordingShell, Shell, SshClient};
use surge::report::Reporter;
use surge::settings::{load_settings_file, resolve, DeployDefaults, ResolvedSettings};
use surge::task::{Args, ExecutionContext, TaskOutcome, TaskRegistry};
use surge::{settings_file, Error};

use super::{parse_kv_flags, parse_set_overrides, CmdResult, GlobalArgs};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub task: String,
    pub host: String,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<RecordedCommand>>,
}

/// Run `task` (or the default task) with trailing `--key value` arguments.
pub fn run(task: Option<&str>, extra: &[String], global: &GlobalArgs) -> CmdResult<RunOutput> {
    let registry = deploy::namespace()?;
    let task_name = match task {
        Some(name) => registry.get(name)?.name.clone(),
        None => registry
            .default_task()
            .map(|t| t.name.clone())
            .ok_or_else(|| Error::internal_unexpected("no default task registered"))?,
    };

    let args = parse_kv_flags(extra)?;
    let settings = load_settings(global)?;
    let host = settings.deploy().host.clone();
    let reporter = if global.json {
        Reporter::stderr()
    } else {
        Reporter::stdout()
    };

    if global.dry_run {
        let remote = RecordingShell::new(host.clone());
        let local = RecordingShell::new("localhost");
        let outcome = {
            let mut ctx = ExecutionContext::new(settings, &remote, &local, &registry, reporter);
            let outcome = ctx.invoke(&task_name, args)?;
            if !global.json {
                print_recorded(&mut ctx.reporter, &local, &remote);
            }
            outcome
        };

        let mut commands = local.commands();
        commands.extend(remote.commands());
        return Ok((
            RunOutput {
                task: task_name,
                host,
                outcome,
                dry_run: true,
                commands: Some(commands),
            },
            0,
        ));
    }

    let remote = SshClient::from_settings(settings.deploy())?;
    let outcome = execute(settings, &remote, &LocalShell, &registry, reporter, &task_name, args)?;

    Ok((
        RunOutput {
            task: task_name,
            host,
            outcome,
            dry_run: false,
            commands: None,
        },
        0,
    ))
}

fn execute(
    settings: ResolvedSettings,
    remote: &dyn Shell,
    local: &dyn Shell,
    registry: &TaskRegistry,
    reporter: Reporter,
    task: &str,
    args: Args,
) -> surge::Result<TaskOutcome> {
    let mut ctx = ExecutionContext::new(settings, remote, local, registry, reporter);
    ctx.invoke(task, args)
}

fn print_recorded(reporter: &mut Reporter, local: &RecordingShell, remote: &RecordingShell) {
    reporter.blank();
    reporter.heading("Dry run: nothing was executed. Commands that would run:");
    for (shell, label) in [(local, "local"), (remote, remote.host())] {
        for line in shell.lines() {
            reporter.plain(format!("  [{}] {}", label, line));
        }
    }
}

/// Layer the settings file and `--set` overrides over the compiled defaults.
pub(crate) fn load_settings(global: &GlobalArgs) -> surge::Result<ResolvedSettings> {
    let location = settings_file(global.settings.as_deref());

    let declared: Map<String, Value> = if location.path.exists() {
        surge::log_status!("settings", "Loading {}", location.path.display());
        load_settings_file(&location.path)?
    } else if location.explicit {
        return Err(Error::config_invalid_value(
            "settings",
            Some(location.path.display().to_string()),
            "settings file not found",
        )
        .with_hint("Pass --settings FILE or set SURGE_SETTINGS"));
    } else {
        Map::new()
    };

    let overrides = parse_set_overrides(&global.set)?;
    resolve(&DeployDefaults::default().to_settings(), &declared, &overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn global_for(path: &std::path::Path) -> GlobalArgs {
        GlobalArgs {
            settings: Some(path.display().to_string()),
            ..GlobalArgs::default()
        }
    }

    #[test]
    fn set_overrides_beat_the_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("surge.json");
        fs::write(
            &path,
            r#"{"HOST": "app.example.com", "User": "deploy", "group": "www", "deploy_path": "/srv/app"}"#,
        )
        .unwrap();

        let mut global = global_for(&path);
        global.set = vec!["branch_name=release".to_string()];
        let settings = load_settings(&global).unwrap();

        assert_eq!(settings.deploy().host, "app.example.com");
        assert_eq!(settings.deploy().branch_name, "release");
        assert_eq!(settings.deploy().chown_target, "deploy:www");
    }

    #[test]
    fn explicit_missing_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let global = global_for(&dir.path().join("absent.json"));
        let err = load_settings(&global).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn dry_run_records_instead_of_executing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("surge.json");
        fs::write(
            &path,
            r#"{"host": "app.example.com", "user": "deploy", "group": "www", "deploy_path": "/srv/app"}"#,
        )
        .unwrap();

        let mut global = global_for(&path);
        global.dry_run = true;
        global.json = true;
        let (output, code) = run(Some("pull"), &[], &global).unwrap();

        assert_eq!(code, 0);
        assert_eq!(output.task, "pull");
        let commands = output.commands.unwrap();
        assert!(commands
            .iter()
            .any(|c| c.line == "cd '/srv/app' && git checkout master"));
    }
}
