//! Template publishing and deployment tracking.
//!
//! Publish: `ABSENT -> CREATED -> VERSIONED`. Deploy: `PENDING` until the
//! controller reports SUCCESS/FAILURE, or the poll budget runs out (TIMEOUT).
//! A non-UUID deployment id is MALFORMED and never polled.

use chrono::Utc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::dnac::{Controller, DeployRequest, TaskRef, TemplatePayload, TemplateRequest};
use crate::error::{FusionError, FusionResult};
use crate::models::{
    Device, DeploymentStatus, DeploymentTask, DeviceType, TemplateRecord, TemplateState,
};

const TEMPLATE_LANGUAGE: &str = "VELOCITY";
const TEMPLATE_VERSION: &str = "2";
const COMMIT_COMMENT: &str = "Commit via API";

/// Bounded polling: fixed interval, at most `max_polls` queries
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

/// Timing knobs for the publish/deploy workflow
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Wait after each template mutation before the next call reads it back
    pub settle: Duration,
    pub task: PollPolicy,
    pub deployment: PollPolicy,
}

impl Timings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            settle: cfg.template_settle,
            task: PollPolicy {
                interval: cfg.task_poll_interval,
                max_polls: cfg.task_max_polls,
            },
            deployment: PollPolicy {
                interval: cfg.deploy_poll_interval,
                max_polls: cfg.deploy_max_polls,
            },
        }
    }
}

/// Sleep unless cancelled first
async fn pause(duration: Duration, cancel: &CancellationToken) -> FusionResult<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(FusionError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Wait for an asynchronous controller task to end; no task id means nothing to wait for.
/// The task is always queried at least once.
pub async fn wait_for_task(
    controller: &dyn Controller,
    task: &TaskRef,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> FusionResult<()> {
    let Some(task_id) = task.task_id.as_deref() else {
        return Ok(());
    };

    let budget = policy.max_polls.max(1);
    for _ in 0..budget {
        let status = controller.task_status(task_id).await?;
        tracing::debug!("Task {} progress: {}", task_id, status.progress);
        if status.end_time.is_some() {
            if status.is_error {
                return Err(FusionError::Task {
                    id: task_id.to_string(),
                    reason: status.failure_reason.unwrap_or(status.progress),
                });
            }
            return Ok(());
        }
        pause(policy.interval, cancel).await?;
    }

    Err(FusionError::Task {
        id: task_id.to_string(),
        reason: format!("not finished after {} polls", budget),
    })
}

/// Settle, then follow the task the mutation started
async fn settle(
    controller: &dyn Controller,
    task: &TaskRef,
    timings: &Timings,
    cancel: &CancellationToken,
) -> FusionResult<()> {
    pause(timings.settle, cancel).await?;
    wait_for_task(controller, task, timings.task, cancel).await
}

/// Create or update the named template with `payload`, then commit a version.
pub async fn publish(
    controller: &dyn Controller,
    cfg: &Config,
    payload: &str,
    device_types: Vec<DeviceType>,
    timings: &Timings,
    cancel: &CancellationToken,
) -> FusionResult<TemplateRecord> {
    tracing::info!("Querying DNA Center for project {}...", cfg.project_name);
    let project = controller.get_project(&cfg.project_name).await?;
    let existing = project.template_id(&cfg.template_name).map(str::to_string);

    let mut record = TemplateRecord {
        id: existing.clone(),
        name: cfg.template_name.clone(),
        project_id: project.id.clone(),
        device_types,
        payload: payload.to_string(),
        version: None,
        state: TemplateState::Absent,
    };

    let request = TemplateRequest {
        id: existing,
        name: record.name.clone(),
        project_id: record.project_id.clone(),
        software_type: cfg.software_type.clone(),
        device_types: record.device_types.clone(),
        payload: TemplatePayload {
            template_content: record.payload.clone(),
        },
        version: TEMPLATE_VERSION.to_string(),
        language: TEMPLATE_LANGUAGE.to_string(),
    };

    tracing::info!("Uploading template {} to DNA Center...", record.name);
    let template_id = match record.id.clone() {
        Some(id) => {
            let task = controller.update_template(&request).await?;
            settle(controller, &task, timings, cancel).await?;
            tracing::info!("Template {} updated", id);
            id
        }
        None => {
            let task = controller.create_template(&project.id, &request).await?;
            settle(controller, &task, timings, cancel).await?;
            let refreshed = controller.get_project(&cfg.project_name).await?;
            let id = refreshed
                .template_id(&record.name)
                .map(str::to_string)
                .ok_or_else(|| {
                    FusionError::NotFound(format!("template {} missing after create", record.name))
                })?;
            tracing::info!("Template {} created", id);
            id
        }
    };
    record.id = Some(template_id.clone());
    record.state = TemplateState::Created;

    tracing::info!("Committing new template version...");
    let task = controller.version_template(&template_id, COMMIT_COMMENT).await?;
    settle(controller, &task, timings, cancel).await?;
    record.version = Some(Utc::now().to_rfc3339());
    record.state = TemplateState::Versioned;
    tracing::info!("Template ready");

    Ok(record)
}

/// Submit the deploy request. A malformed deployment id comes back as a
/// terminal MALFORMED task carrying the raw response.
pub async fn start_deployment(
    controller: &dyn Controller,
    template: &TemplateRecord,
    target: &Device,
) -> FusionResult<DeploymentTask> {
    let template_id = template
        .deployable_id()
        .ok_or_else(|| FusionError::Unversioned(template.name.clone()))?;

    tracing::info!("Starting deployment to {} at {}", target.hostname, target.management_ip);
    let resp = controller
        .deploy_template(&DeployRequest::for_device_ip(template_id, &target.management_ip))
        .await?;

    let task = DeploymentTask::from_deploy_response(&resp.deployment_id, resp.raw);
    if task.status == DeploymentStatus::Malformed {
        tracing::error!("Error deploying template: {}", task.detail);
    } else {
        tracing::info!("Deployment {} started", task.deployment_id);
    }
    Ok(task)
}

/// Poll until a terminal state. Cancellation is observed between polls.
pub async fn poll_deployment(
    controller: &dyn Controller,
    task: &mut DeploymentTask,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> FusionResult<()> {
    while !task.status.is_terminal() {
        if task.polls >= policy.max_polls {
            task.mark_timeout();
            break;
        }
        if cancel.is_cancelled() {
            return Err(FusionError::Cancelled);
        }

        let resp = controller.deployment_status(&task.deployment_id).await?;
        task.record_poll(DeploymentStatus::from_controller(&resp.status), resp.raw);
        if task.status.is_terminal() {
            break;
        }
        tracing::info!("Deployment status: {}", resp.status);
        if task.polls < policy.max_polls {
            pause(policy.interval, cancel).await?;
        }
    }
    Ok(())
}

/// Deploy and track to a terminal state
pub async fn deploy(
    controller: &dyn Controller,
    template: &TemplateRecord,
    target: &Device,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> FusionResult<DeploymentTask> {
    let mut task = start_deployment(controller, template, target).await?;
    poll_deployment(controller, &mut task, policy, cancel).await?;
    report(&task);
    Ok(task)
}

/// Log the outcome of a finished deployment
pub fn report(task: &DeploymentTask) {
    match task.status {
        DeploymentStatus::Success => tracing::info!("Deployment complete!"),
        DeploymentStatus::Failure => {
            tracing::error!("Deployment failed! Controller detail: {}", task.detail)
        }
        DeploymentStatus::Malformed => {
            tracing::error!("Deployment was not started; controller response: {}", task.detail)
        }
        DeploymentStatus::Timeout => tracing::warn!(
            "Deployment {} still not finished after {} polls; last status: {}",
            task.deployment_id,
            task.polls,
            task.detail
        ),
        DeploymentStatus::Pending => {}
    }
}
