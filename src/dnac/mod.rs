pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

use async_trait::async_trait;

use crate::error::FusionResult;

pub use client::DnacClient;
pub use types::*;

/// Controller capabilities the pipeline depends on.
///
/// Implemented by [`DnacClient`]; every stage takes `&dyn Controller` so the
/// flow can run against an in-memory controller.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Devices whose hostname matches any of the globs
    async fn list_devices(&self, hostname_globs: &[String]) -> FusionResult<Vec<NetworkDevice>>;

    /// SDA fabric border settings for a device, by management IP
    async fn border_device_detail(&self, management_ip: &str) -> FusionResult<BorderDeviceDetail>;

    /// Template project by exact name; unknown projects are an error
    async fn get_project(&self, name: &str) -> FusionResult<Project>;

    async fn create_template(
        &self,
        project_id: &str,
        req: &TemplateRequest,
    ) -> FusionResult<TaskRef>;

    async fn update_template(&self, req: &TemplateRequest) -> FusionResult<TaskRef>;

    /// Commit a new version of the template
    async fn version_template(&self, template_id: &str, comments: &str) -> FusionResult<TaskRef>;

    async fn deploy_template(&self, req: &DeployRequest) -> FusionResult<DeployResponse>;

    async fn deployment_status(
        &self,
        deployment_id: &str,
    ) -> FusionResult<DeploymentStatusResponse>;

    async fn task_status(&self, task_id: &str) -> FusionResult<TaskStatus>;
}
