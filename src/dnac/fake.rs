//! In-memory controller used by tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::types::*;
use super::Controller;
use crate::error::{FusionError, FusionResult};

pub struct FakeController {
    devices: Vec<NetworkDevice>,
    borders: HashMap<String, BorderDeviceDetail>,
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    project: Option<Project>,
    deploy_id: String,
    statuses: VecDeque<String>,
    task_error: Option<String>,
    calls: Vec<String>,
    template_requests: Vec<TemplateRequest>,
    deploy_requests: Vec<DeployRequest>,
}

impl FakeController {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            borders: HashMap::new(),
            state: Mutex::new(FakeState {
                deploy_id: uuid::Uuid::new_v4().to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn with_device(mut self, hostname: &str, ip: &str, family: &str, series: &str) -> Self {
        self.devices.push(NetworkDevice {
            hostname: Some(hostname.to_string()),
            management_ip_address: ip.to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            series: Some(series.to_string()),
            family: Some(family.to_string()),
        });
        self
    }

    /// Register border detail for a management IP, given as controller JSON
    pub fn with_border(mut self, ip: &str, detail: serde_json::Value) -> Self {
        let detail: BorderDeviceEnvelope =
            serde_json::from_value(detail).expect("fake border detail must be valid");
        self.borders.insert(ip.to_string(), detail.into_detail());
        self
    }

    pub fn with_project(self, name: &str) -> Self {
        self.lock().project = Some(Project {
            name: name.to_string(),
            id: format!("proj-{}", name),
            templates: Vec::new(),
        });
        self
    }

    pub fn with_template(self, name: &str, id: &str) -> Self {
        if let Some(project) = self.lock().project.as_mut() {
            project.templates.push(ProjectTemplate {
                name: name.to_string(),
                id: id.to_string(),
            });
        }
        self
    }

    pub fn with_deploy_id(self, id: &str) -> Self {
        self.lock().deploy_id = id.to_string();
        self
    }

    /// Statuses returned by successive deployment polls; exhausted -> IN_PROGRESS
    pub fn with_statuses(self, statuses: &[&str]) -> Self {
        self.lock().statuses = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_task_error(self, reason: &str) -> Self {
        self.lock().task_error = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn template_requests(&self) -> Vec<TemplateRequest> {
        self.lock().template_requests.clone()
    }

    pub fn deploy_requests(&self) -> Vec<DeployRequest> {
        self.lock().deploy_requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake controller state poisoned")
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl Controller for FakeController {
    async fn list_devices(&self, hostname_globs: &[String]) -> FusionResult<Vec<NetworkDevice>> {
        self.record(format!("list_devices:{}", hostname_globs.join(",")));
        Ok(self.devices.clone())
    }

    async fn border_device_detail(&self, management_ip: &str) -> FusionResult<BorderDeviceDetail> {
        self.record(format!("border_device_detail:{}", management_ip));
        self.borders.get(management_ip).cloned().ok_or(FusionError::Api {
            status: 404,
            body: format!("no border device at {}", management_ip),
        })
    }

    async fn get_project(&self, name: &str) -> FusionResult<Project> {
        self.record(format!("get_project:{}", name));
        match &self.lock().project {
            Some(p) if p.name == name => Ok(p.clone()),
            _ => Err(FusionError::NotFound(format!("template project {} not found", name))),
        }
    }

    async fn create_template(
        &self,
        project_id: &str,
        req: &TemplateRequest,
    ) -> FusionResult<TaskRef> {
        self.record(format!("create_template:{}", project_id));
        let mut state = self.lock();
        state.template_requests.push(req.clone());
        let new_id = format!("tmpl-{}", state.template_requests.len());
        if let Some(project) = state.project.as_mut() {
            project.templates.push(ProjectTemplate {
                name: req.name.clone(),
                id: new_id,
            });
        }
        Ok(TaskRef {
            task_id: Some("task-create".to_string()),
        })
    }

    async fn update_template(&self, req: &TemplateRequest) -> FusionResult<TaskRef> {
        self.record(format!("update_template:{}", req.id.clone().unwrap_or_default()));
        self.lock().template_requests.push(req.clone());
        Ok(TaskRef {
            task_id: Some("task-update".to_string()),
        })
    }

    async fn version_template(&self, template_id: &str, comments: &str) -> FusionResult<TaskRef> {
        self.record(format!("version_template:{}:{}", template_id, comments));
        Ok(TaskRef::default())
    }

    async fn deploy_template(&self, req: &DeployRequest) -> FusionResult<DeployResponse> {
        self.record(format!("deploy_template:{}", req.template_id));
        let mut state = self.lock();
        state.deploy_requests.push(req.clone());
        let id = state.deploy_id.clone();
        Ok(DeployResponse {
            deployment_id: id.clone(),
            raw: json!({ "deploymentId": id }),
        })
    }

    async fn deployment_status(
        &self,
        deployment_id: &str,
    ) -> FusionResult<DeploymentStatusResponse> {
        self.record(format!("deployment_status:{}", deployment_id));
        let status = self
            .lock()
            .statuses
            .pop_front()
            .unwrap_or_else(|| "IN_PROGRESS".to_string());
        Ok(DeploymentStatusResponse {
            raw: json!({ "deploymentId": deployment_id, "status": status }),
            status,
        })
    }

    async fn task_status(&self, task_id: &str) -> FusionResult<TaskStatus> {
        self.record(format!("task_status:{}", task_id));
        let task_error = self.lock().task_error.clone();
        Ok(TaskStatus {
            progress: "done".to_string(),
            end_time: Some(1),
            is_error: task_error.is_some(),
            failure_reason: task_error,
        })
    }
}
