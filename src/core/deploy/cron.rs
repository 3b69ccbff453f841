use serde_json::{json, Value};

use super::optional_arg;
use crate::error::Result;
use crate::remote::ShellCommand;
use crate::settings::BoolSelection;
use crate::task::{Args, ExecutionContext, Task, TaskRegistry};

pub(super) fn register(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(
        Task::new("update_crontab", update_crontab)
            .alias("cron")
            .help("Replace CRONTAB_OWNER's crontab on HOST with CRON_FILE")
            .params(["deploy_path", "cron_file", "crontab_owner"])
            .with_standard_hooks(BoolSelection::None),
    )
}

fn update_crontab(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let (Some(cron_file), Some(owner)) = (
        optional_arg(args, "cron_file")?,
        optional_arg(args, "crontab_owner")?,
    ) else {
        return Ok(Value::Null);
    };

    ctx.reporter.success("Updating crontab...");
    let command = ShellCommand::new("crontab").args(["-u", owner.as_str(), cron_file.as_str()]);
    let command = match optional_arg(args, "deploy_path")? {
        Some(dir) => command.in_dir(dir),
        None => command,
    };
    ctx.sudo_remote(command)?;

    Ok(json!({ "owner": owner, "cronFile": cron_file }))
}
