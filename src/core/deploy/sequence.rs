//! `full_deploy` as an explicit stage machine.
//!
//! Stages advance strictly in order. An error from any stage aborts the run;
//! nothing already done on the host is rolled back.

use serde::Serialize;
use serde_json::{json, Value};

use super::flag;
use crate::error::{Error, Result};
use crate::settings::BoolSelection;
use crate::task::{Args, ExecutionContext, Task, TaskOutcome, TaskRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStage {
    Start,
    LocalClean,
    RemoteClean,
    FixOwnerships,
    Pull,
    UpdateSubmodules,
    FixLogfilePermissions,
    InstallRequirements,
    Collectstatic,
    SyncDb,
    RunMigrations,
    RunExtras,
    RefixOwnerships,
    BounceServices,
    UpdateCrontab,
    Done,
}

impl DeployStage {
    pub fn next(self) -> DeployStage {
        use DeployStage::*;
        match self {
            Start => LocalClean,
            LocalClean => RemoteClean,
            RemoteClean => FixOwnerships,
            FixOwnerships => Pull,
            Pull => UpdateSubmodules,
            UpdateSubmodules => FixLogfilePermissions,
            FixLogfilePermissions => InstallRequirements,
            InstallRequirements => Collectstatic,
            Collectstatic => SyncDb,
            SyncDb => RunMigrations,
            RunMigrations => RunExtras,
            RunExtras => RefixOwnerships,
            RefixOwnerships => BounceServices,
            BounceServices => UpdateCrontab,
            UpdateCrontab => Done,
            Done => Done,
        }
    }

    /// The task a stage runs. `Start` and `Done` run nothing.
    pub fn task(self) -> Option<&'static str> {
        use DeployStage::*;
        match self {
            Start | Done => None,
            LocalClean => Some("is_local_clean"),
            RemoteClean => Some("is_remote_clean"),
            FixOwnerships | RefixOwnerships => Some("fix_ownerships"),
            Pull => Some("pull"),
            UpdateSubmodules => Some("update_submodules"),
            FixLogfilePermissions => Some("fix_logfile_permissions"),
            InstallRequirements => Some("install_requirements"),
            Collectstatic => Some("collectstatic"),
            SyncDb => Some("sync_db"),
            RunMigrations => Some("run_migrations"),
            RunExtras => Some("run_extras"),
            BounceServices => Some("bounce_services"),
            UpdateCrontab => Some("update_crontab"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Ran,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: DeployStage,
    pub task: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StageReport {
    fn from_outcome(stage: DeployStage, task: &str, outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Ran { .. } => Self {
                stage,
                task: task.to_string(),
                status: StageStatus::Ran,
                reason: None,
            },
            TaskOutcome::Skipped { reason } => Self {
                stage,
                task: task.to_string(),
                status: StageStatus::Skipped,
                reason: Some(reason),
            },
        }
    }
}

pub(super) fn register(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(
        Task::new("full_deploy", full_deploy)
            .help("Check, pull, install, migrate, bounce and update the crontab (default task)")
            .params(["skip_migrate"])
            .composite()
            .default_task()
            .with_standard_hooks(BoolSelection::only(["skip_migrate"])),
    )?;

    registry.register(
        Task::new("full_deploy_with_migrate", full_deploy_with_migrate)
            .alias("extra-full-deploy")
            .alias("xfull-deploy")
            .help("full_deploy with SKIP_MIGRATE forced off")
            .composite()
            .with_standard_hooks(BoolSelection::None),
    )?;

    Ok(())
}

fn full_deploy(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let skip_migrate = flag(args, "skip_migrate")?;
    let mut reports = Vec::new();

    ctx.reporter.success("Beginning deployment...");
    ctx.reporter.blank();

    let mut stage = DeployStage::Start;
    loop {
        stage = stage.next();
        match stage {
            DeployStage::Done => break,
            DeployStage::LocalClean => ctx.reporter.heading("Checking pre-requisites..."),
            DeployStage::FixOwnerships => {
                ctx.reporter.blank();
                ctx.reporter.success("Starting deployment...");
                ctx.reporter.blank();
                ctx.reporter.success("Updating environment...");
            }
            _ => {}
        }

        let Some(task) = stage.task() else {
            return Err(Error::internal_unexpected(format!(
                "deploy stage {:?} has no task",
                stage
            )));
        };

        if stage == DeployStage::RunMigrations && skip_migrate {
            reports.push(StageReport {
                stage,
                task: task.to_string(),
                status: StageStatus::Skipped,
                reason: Some("skip_migrate is set".to_string()),
            });
            continue;
        }

        log_status!("deploy", "{:?} -> {}", stage, task);
        let outcome = ctx.call(task)?;
        reports.push(StageReport::from_outcome(stage, task, outcome));
    }

    ctx.reporter.success("Done!");

    let ran = reports
        .iter()
        .filter(|r| r.status == StageStatus::Ran)
        .count();
    Ok(json!({
        "stages": reports,
        "ran": ran,
        "skipped": reports.len() - ran,
    }))
}

fn full_deploy_with_migrate(ctx: &mut ExecutionContext<'_>, _args: &Args) -> Result<Value> {
    match ctx.call_with("full_deploy", json!({ "skip_migrate": false }))? {
        TaskOutcome::Ran { value } => Ok(value),
        TaskOutcome::Skipped { reason } => Ok(json!({ "skipped": reason })),
    }
}
