use serde_json::{json, Value};

use super::{optional_arg, required_arg};
use crate::error::Result;
use crate::remote::ShellCommand;
use crate::settings::BoolSelection;
use crate::task::{Args, ExecutionContext, Task, TaskRegistry};

pub(super) fn register(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(
        Task::new("fix_ownerships", fix_ownerships)
            .alias("fixown")
            .help("chown the project checkout to CHOWN_TARGET (USER:GROUP)")
            .params(["deploy_path", "chown_target"])
            .with_standard_hooks(BoolSelection::None),
    )?;

    registry.register(
        Task::new("fix_logfile_permissions", fix_logfile_permissions)
            .alias("fixlog")
            .help("Make files under LOG_PATH group-writable and world-readable")
            .params(["deploy_path", "log_path"])
            .with_standard_hooks(BoolSelection::None),
    )?;

    Ok(())
}

fn fix_ownerships(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let deploy_path = required_arg(args, "deploy_path")?;
    let target = required_arg(args, "chown_target")?;

    ctx.reporter.info("Fixing project ownerships");
    ctx.sudo_remote(
        ShellCommand::new("chown")
            .args([target.as_str(), "--recursive", "."])
            .in_dir(deploy_path),
    )?;

    Ok(json!({ "chownTarget": target }))
}

fn fix_logfile_permissions(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let Some(log_path) = optional_arg(args, "log_path")? else {
        return Ok(Value::Null);
    };
    let deploy_path = required_arg(args, "deploy_path")?;

    ctx.reporter.info("Ensuring proper permissions on log files (0664)");
    ctx.sudo_remote(
        ShellCommand::new("chmod")
            .args([
                "--preserve-root",
                "--changes",
                "--recursive",
                "a=rX,ug+w",
                log_path.as_str(),
            ])
            .in_dir(deploy_path),
    )?;

    Ok(json!({ "logPath": log_path }))
}
