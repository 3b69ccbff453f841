use serde_json::Value;

use super::required_arg;
use crate::error::{Error, Result, WorkingTreeDirtyDetails};
use crate::remote::ShellCommand;
use crate::settings::BoolSelection;
use crate::task::{Args, ExecutionContext, MergeOptions, Require, TagOriginal, Task, TaskRegistry};

pub(super) fn register(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(
        Task::new("sudo_check", sudo_check)
            .alias("sudo")
            .help("Check that sudo works without a password prompt on HOST")
            .with_standard_hooks(BoolSelection::None),
    )?;

    registry.register(
        Task::new("show_settings", show_settings)
            .alias("show")
            .help("Print the resolved settings")
            .hook(TagOriginal)
            .hook(MergeOptions),
    )?;

    registry.register(
        Task::new("is_local_clean", is_local_clean)
            .alias("local")
            .help("Fail if the local git working tree has changes (REQUIRE_CLEAN)")
            .with_standard_hooks(BoolSelection::None)
            .hook(Require::soft("require_clean", true)),
    )?;

    registry.register(
        Task::new("is_remote_clean", is_remote_clean)
            .alias("remote")
            .help("Fail if the git tree on HOST has changes (REQUIRE_REMOTE_CLEAN)")
            .params(["git_tree"])
            .with_standard_hooks(BoolSelection::None)
            .hook(Require::soft("require_remote_clean", true)),
    )?;

    Ok(())
}

fn sudo_check(ctx: &mut ExecutionContext<'_>, _args: &Args) -> Result<Value> {
    ctx.reporter.info("Validating sudo.");

    let output = ctx.remote.sudo(&ShellCommand::new("true"));
    if output.success {
        Ok(Value::Bool(true))
    } else {
        ctx.reporter.error("Could not obtain sudo!");
        Ok(Value::Bool(false))
    }
}

fn show_settings(ctx: &mut ExecutionContext<'_>, _args: &Args) -> Result<Value> {
    ctx.show_settings_once();
    Ok(Value::Object(ctx.settings.as_map().clone()))
}

pub(crate) fn porcelain_changes(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_end().to_string())
        .collect()
}

fn is_local_clean(ctx: &mut ExecutionContext<'_>, _args: &Args) -> Result<Value> {
    ctx.reporter.info("Ensuring local working area is clean...");

    let output = ctx.run_local(ShellCommand::new("git").args(["status", "--porcelain"]))?;
    let changes = porcelain_changes(&output.stdout);
    if !changes.is_empty() {
        return Err(Error::working_tree_dirty(WorkingTreeDirtyDetails {
            location: "local".to_string(),
            path: ".".to_string(),
            changes,
        })
        .with_hint("Commit or stash your changes, or pass --require_clean false"));
    }

    Ok(Value::Bool(true))
}

fn is_remote_clean(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let tree = required_arg(args, "git_tree")?;
    ctx.reporter.info("Ensuring remote working area is clean...");

    let output = ctx.run_remote(ShellCommand::new("git").args([
        format!("--work-tree={}", tree),
        format!("--git-dir={}/.git", tree),
        "status".to_string(),
        "--porcelain".to_string(),
    ]))?;

    let changes = porcelain_changes(&output.stdout);
    if !changes.is_empty() {
        return Err(Error::working_tree_dirty(WorkingTreeDirtyDetails {
            location: "remote".to_string(),
            path: tree,
            changes,
        })
        .with_hint("Inspect the deploy checkout on HOST, or pass --require_remote_clean false"));
    }

    Ok(Value::Bool(true))
}
