use serde_json::{json, Value};

use super::required_arg;
use crate::error::Result;
use crate::remote::ShellCommand;
use crate::settings::BoolSelection;
use crate::task::{Args, ExecutionContext, Task, TaskOutcome, TaskRegistry};

pub(super) fn register(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(
        Task::new("pull", pull)
            .help("git fetch, checkout BRANCH_NAME and pull in DEPLOY_PATH")
            .params(["deploy_path", "branch_name"])
            .with_standard_hooks(BoolSelection::None),
    )?;

    registry.register(
        Task::new("update_submodules", update_submodules)
            .alias("sup")
            .help("Initialize and update git submodules recursively")
            .params(["deploy_path"])
            .with_standard_hooks(BoolSelection::None),
    )?;

    registry.register(
        Task::new("full_pull", full_pull)
            .help("fix_ownerships, pull, update_submodules, fix_ownerships")
            .composite()
            .with_standard_hooks(BoolSelection::None),
    )?;

    Ok(())
}

fn pull(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;
    let branch = required_arg(args, "branch_name")?;

    ctx.reporter.info(format!("Pulling from {}", branch));

    let git = |subcommand: &[&str]| {
        ShellCommand::new("git")
            .args(subcommand.iter().copied())
            .in_dir(deploy_path.clone())
    };
    ctx.run_remote(git(&["fetch"]))?;
    ctx.run_remote(git(&["checkout", branch.as_str()]))?;
    ctx.run_remote(git(&["pull"]))?;

    Ok(json!({ "branch": branch }))
}

fn update_submodules(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;

    ctx.reporter.info("Initializing and updating submodules recursively");
    ctx.run_remote(
        ShellCommand::new("git")
            .args(["submodule", "update", "--init", "--recursive"])
            .in_dir(deploy_path),
    )?;

    Ok(Value::Bool(true))
}

fn full_pull(ctx: &mut ExecutionContext<'_>, _args: &Args) -> Result<Value> {
    let mut steps = Vec::new();
    for name in ["fix_ownerships", "pull", "update_submodules", "fix_ownerships"] {
        let outcome = ctx.call(name)?;
        steps.push(json!({
            "task": name,
            "skipped": matches!(outcome, TaskOutcome::Skipped { .. }),
        }));
    }
    Ok(Value::Array(steps))
}
