use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{flag, list_arg};
use crate::error::Result;
use crate::remote::{CommandOutput, ShellCommand};
use crate::settings::{BoolSelection, ServiceManager};
use crate::task::{Args, ExecutionContext, SkipIfNot, Task, TaskRegistry};

/// What the init system reports for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
    NotInstalled,
}

impl ServiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceStatus::Running => "Running",
            ServiceStatus::Stopped => "Stopped/Waiting",
            ServiceStatus::Unknown => "Unknown",
            ServiceStatus::NotInstalled => "Not installed",
        }
    }
}

/// Interpret the output of the status command for `service`.
pub fn parse_status(manager: ServiceManager, service: &str, output: &str) -> ServiceStatus {
    match manager {
        ServiceManager::Upstart => {
            if output.contains("unrecognized service") {
                ServiceStatus::NotInstalled
            } else if output.contains(&format!("{} stop/waiting", service)) {
                ServiceStatus::Stopped
            } else if output.contains(&format!("{} start/running", service)) {
                ServiceStatus::Running
            } else {
                ServiceStatus::Unknown
            }
        }
        ServiceManager::Systemd => {
            if output.contains("Loaded: not-found") {
                ServiceStatus::NotInstalled
            } else if output.contains("Active: inactive") {
                ServiceStatus::Stopped
            } else if output.contains("Active: active (running)") {
                ServiceStatus::Running
            } else {
                ServiceStatus::Unknown
            }
        }
    }
}

fn status_command(manager: ServiceManager, service: &str) -> ShellCommand {
    match manager {
        ServiceManager::Upstart => ShellCommand::new("service").args([service, "status"]),
        ServiceManager::Systemd => {
            ShellCommand::new("systemctl").args(["status", "--full", "--no-pager", service])
        }
    }
}

fn restart_command(manager: ServiceManager, service: &str) -> ShellCommand {
    match manager {
        ServiceManager::Upstart => ShellCommand::new("service").args([service, "restart"]),
        ServiceManager::Systemd => ShellCommand::new("systemctl").args(["restart", service]),
    }
}

/// Status commands exit non-zero for stopped services, so the output is read
/// regardless of exit code.
fn probe_status(ctx: &ExecutionContext<'_>, manager: ServiceManager, service: &str) -> CommandOutput {
    ctx.remote.sudo(&status_command(manager, service))
}

pub(super) fn register(registry: &mut TaskRegistry) -> Result<()> {
    registry.register(
        Task::new("restart_nginx", restart_nginx)
            .help("Restart nginx on HOST")
            .params(["os_service_manager"])
            .with_standard_hooks(BoolSelection::None)
            .hook(SkipIfNot::new("restart_nginx", true)),
    )?;

    registry.register(
        Task::new("bounce_services", bounce_services)
            .alias("bounce")
            .help("Restart each service in BOUNCE_SERVICES, then nginx if RESTART_NGINX")
            .params([
                "bounce_services",
                "bounce_services_only_if_running",
                "os_service_manager",
            ])
            .composite()
            .with_standard_hooks(BoolSelection::only([
                "bounce_services_only_if_running",
                "restart_nginx",
            ])),
    )?;

    registry.register(
        Task::new("services_status", services_status)
            .help("Print the status of each service in BOUNCE_SERVICES")
            .params(["bounce_services", "os_service_manager"])
            .with_standard_hooks(BoolSelection::None),
    )?;

    Ok(())
}

fn restart_nginx(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let manager = ServiceManager::from_value(args.get("os_service_manager"))?;

    ctx.reporter.info("Restarting Nginx");
    ctx.sudo_remote(restart_command(manager, "nginx"))?;

    Ok(json!({ "manager": manager }))
}

fn bounce_services(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let services = list_arg(args, "bounce_services")?;
    if services.is_empty() {
        return Ok(Value::Null);
    }
    let only_if_running = flag(args, "bounce_services_only_if_running")?;
    let manager = ServiceManager::from_value(args.get("os_service_manager"))?;

    if only_if_running {
        ctx.reporter
            .info("Bouncing processes...(BOUNCING_SERVICES_ONLY_IF_RUNNING)");
    } else {
        ctx.reporter.info("Bouncing processes...");
    }
    ctx.reporter.info(services.join(", "));

    // Every status is read before anything is restarted.
    let statuses: Vec<(String, ServiceStatus)> = services
        .iter()
        .map(|service| {
            let output = probe_status(ctx, manager, service);
            (service.clone(), parse_status(manager, service, &output.combined()))
        })
        .collect();

    let mut restarted = Vec::new();
    let mut not_bouncing = Vec::new();
    let mut not_found = Vec::new();
    let mut report = Map::new();

    for (service, status) in &statuses {
        report.insert(service.clone(), json!(status));

        if *status == ServiceStatus::NotInstalled {
            not_found.push(service.clone());
            continue;
        }

        ctx.reporter
            .success(format!("{}: {}", service, status.label()));
        if *status != ServiceStatus::Running && only_if_running {
            ctx.reporter.error(format!("{} NOT bouncing", service));
            not_bouncing.push(service.clone());
            continue;
        }

        ctx.sudo_remote(restart_command(manager, service))?;
        restarted.push(service.clone());
    }

    let host = ctx.remote.host().to_string();
    for service in &not_found {
        ctx.reporter
            .accent(format!("{} not found on {}", service, host));
    }

    let nginx = ctx.call("restart_nginx")?;

    Ok(json!({
        "statuses": report,
        "restarted": restarted,
        "notBouncing": not_bouncing,
        "notFound": not_found,
        "nginxRestarted": !nginx.is_skipped(),
    }))
}

fn services_status(ctx: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    let services = list_arg(args, "bounce_services")?;
    let manager = ServiceManager::from_value(args.get("os_service_manager"))?;

    let mut report = Map::new();
    for service in &services {
        let output = probe_status(ctx, manager, service).combined();
        let down = match manager {
            ServiceManager::Upstart => output.contains(&format!("{} stop/waiting", service)),
            ServiceManager::Systemd => {
                output.contains("Active: inactive") || output.contains("Active: failed")
            }
        };

        let text = output.trim_end().to_string();
        if down {
            ctx.reporter.error(text);
        } else {
            ctx.reporter.success(text);
        }
        report.insert(service.clone(), json!(parse_status(manager, service, &output)));
    }

    Ok(Value::Object(report))
}
