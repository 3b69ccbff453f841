use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

use super::{list_arg, required_arg};
use crate::error::Result;
use crate::remote::ShellCommand;
use crate::settings::BoolSelection;
use crate::task::{Args, ExecutionContext, Require, Task, TaskRegistry};

/// Used when the project's STATIC_ROOT cannot be read.
const FALLBACK_STATIC_ROOT: &str = "collected-assets";

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['"]([^'"]*)['"]"#).unwrap());

pub(super) fn register(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(
        Task::new("install_requirements", install_requirements)
            .alias("req")
            .help("Install pinned dependencies with pipenv sync")
            .params(["deploy_path"])
            .with_standard_hooks(BoolSelection::None),
    )?;

    registry.register(
        Task::new("collectstatic", collectstatic)
            .alias("collect")
            .help("Collect Django static files and touch *.less/*.js in STATIC_ROOT")
            .params(["deploy_path", "chown_target"])
            .with_standard_hooks(BoolSelection::None)
            .hook(Require::soft("django_project", true)),
    )?;

    registry.register(
        Task::new("sync_db", sync_db)
            .alias("syncdb")
            .help("Run manage.py syncdb (SKIP_SYNCDB, DJANGO_PROJECT)")
            .params(["deploy_path"])
            .with_standard_hooks(BoolSelection::None)
            .hook(Require::soft("skip_syncdb", false))
            .hook(Require::soft("django_project", true)),
    )?;

    registry.register(
        Task::new("run_migrations", run_migrations)
            .alias("migrate")
            .help("Run manage.py migrate, plus EXTRA_MIGRATIONS databases")
            .params(["deploy_path", "extra_migrations"])
            .with_standard_hooks(BoolSelection::None)
            .hook(Require::soft("skip_migrate", false))
            .hook(Require::soft("django_project", true)),
    )?;

    registry.register(
        Task::new("run_extras", run_extras)
            .help("Run each command in EXTRA_COMMANDS on HOST")
            .params(["deploy_path", "extra_commands"])
            .with_standard_hooks(BoolSelection::None),
    )?;

    Ok(())
}

fn manage(deploy_path: &str) -> ShellCommand {
    ShellCommand::new("./manage.py").in_dir(deploy_path)
}

fn install_requirements(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;

    ctx.reporter.info("Installing pinned dependencies from Pipfile.lock");
    ctx.run_remote(ShellCommand::new("pipenv").arg("sync").in_dir(deploy_path))?;

    Ok(Value::Bool(true))
}

/// The quoted value of the `SETTINGS_MODULE` line in `diffsettings` output.
pub(crate) fn settings_module(diffsettings: &str) -> Option<String> {
    let line = diffsettings.lines().find(|l| l.contains("SETTINGS_MODULE"))?;
    let (_, rhs) = line.split_once('=')?;
    QUOTED
        .captures(rhs)
        .map(|c| c[1].trim().to_string())
        .filter(|m| !m.is_empty())
}

fn collectstatic(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;
    let chown_target = required_arg(args, "chown_target")?;

    ctx.reporter.info("Collecting static resources");
    ctx.run_remote(manage(&deploy_path).args(["collectstatic", "-v0", "--noinput"]))?;

    let diff = ctx.probe_remote(manage(&deploy_path).args(["diffsettings", "--all"]));
    let module = settings_module(&diff.stdout);

    let static_root = module
        .as_deref()
        .and_then(|module| {
            let probe = format!("from {} import STATIC_ROOT; print(STATIC_ROOT)", module);
            let out = ctx.probe_remote(
                ShellCommand::new("pipenv")
                    .args(["run", "python", "-c", probe.as_str()])
                    .in_dir(deploy_path.clone()),
            );
            let root = out.stdout.trim().to_string();
            (out.success && !root.is_empty()).then_some(root)
        })
        .unwrap_or_else(|| FALLBACK_STATIC_ROOT.to_string());

    let exists = ctx
        .probe_remote(ShellCommand::new("test").args(["-e", static_root.as_str()]).in_dir(deploy_path.clone()))
        .success;

    if !exists {
        ctx.reporter
            .error("Could not locate the STATIC_ROOT path for this project, skipping touches.");
        return Ok(json!({ "staticRoot": static_root, "touched": false }));
    }

    ctx.reporter
        .info(format!("Touching *.less and *.js in {}", static_root));
    ctx.run_remote(
        ShellCommand::new("find")
            .args([
                static_root.as_str(),
                "(",
                "-name",
                "*.less",
                "-or",
                "-name",
                "*.js",
                ")",
                "-not",
                "-path",
                "*/_cache*/*",
                "-exec",
                "touch",
                "{}",
                "+",
            ])
            .in_dir(deploy_path.clone()),
    )?;

    // Ownership of collected files is only fixed on a direct run; full_deploy
    // chowns the whole checkout afterwards.
    if ctx.called_task.as_deref() == Some("collectstatic") {
        ctx.sudo_remote(
            ShellCommand::new("chown")
                .args([chown_target.as_str(), "--recursive", static_root.as_str()])
                .in_dir(deploy_path),
        )?;
    }

    Ok(json!({ "staticRoot": static_root, "touched": true }))
}

fn sync_db(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;

    ctx.reporter.info("Sync DB");
    ctx.run_remote(manage(&deploy_path).arg("syncdb"))?;

    Ok(Value::Bool(true))
}

fn run_migrations(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;
    let extra = list_arg(args, "extra_migrations")?;

    ctx.reporter.info("Running migrations");
    ctx.run_remote(manage(&deploy_path).arg("migrate"))?;

    if !extra.is_empty() {
        ctx.reporter.blank();
        ctx.reporter.info("Running extra migrations");
        for database in &extra {
            ctx.run_remote(manage(&deploy_path).args(["migrate", "--database", database.as_str()]))?;
        }
    }

    Ok(json!({ "databases": extra }))
}

fn run_extras(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;
    let commands = list_arg(args, "extra_commands")?;

    for line in &commands {
        ctx.reporter.info(format!("Extra:  {}", line));
        ctx.run_remote(ShellCommand::script(line.as_str()).in_dir(deploy_path.clone()))?;
    }

    Ok(json!({ "commands": commands }))
}
