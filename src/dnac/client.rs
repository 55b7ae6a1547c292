use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::types::*;
use super::Controller;
use crate::config::Config;
use crate::error::{FusionError, FusionResult};

/// DNA Center API client
pub struct DnacClient {
    base_url: String,
    token: String,
    client: Client,
}

impl DnacClient {
    /// Build the HTTP client and authenticate; any failure is a connection error
    pub async fn connect(cfg: &Config) -> FusionResult<Self> {
        let base_url = cfg.base_url();
        let connect_err = |reason: String| FusionError::Connect {
            host: cfg.dnac_host.clone(),
            reason,
        };

        let client = Client::builder()
            .timeout(cfg.request_timeout)
            .danger_accept_invalid_certs(!cfg.verify_tls)
            .build()
            .map_err(|e| connect_err(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!("Attempting connection to {} as user {}", cfg.dnac_host, cfg.dnac_user);
        let resp = client
            .post(format!("{}/dna/system/api/v1/auth/token", base_url))
            .basic_auth(&cfg.dnac_user, Some(&cfg.dnac_password))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| connect_err(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(connect_err(format!("authentication failed ({}): {}", status, body)));
        }

        let auth: AuthToken = resp.json().await.map_err(|e| connect_err(e.to_string()))?;
        tracing::info!("Connected to DNA Center");

        Ok(Self {
            base_url,
            token: auth.token,
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/dna/intent/api/v1{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("X-Auth-Token", self.token.as_str())
            .header("Accept", "application/json")
    }

    /// Turn non-2xx responses into API errors, otherwise decode the body
    async fn decode<T: DeserializeOwned>(resp: Response) -> FusionResult<T> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FusionError::Api { status, body });
        }
        Ok(resp.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> FusionResult<T> {
        let resp = self
            .authed(self.client.get(self.api_url(path)).query(query))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> FusionResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let resp = self
            .authed(self.client.post(self.api_url(path)))
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }
}

#[async_trait]
impl Controller for DnacClient {
    async fn list_devices(&self, hostname_globs: &[String]) -> FusionResult<Vec<NetworkDevice>> {
        let query: Vec<(&str, &str)> = hostname_globs
            .iter()
            .map(|glob| ("hostname", glob.as_str()))
            .collect();
        let resp: DnacResponse<Vec<NetworkDevice>> =
            self.get_json("/network-device", &query).await?;
        Ok(resp.response)
    }

    async fn border_device_detail(&self, management_ip: &str) -> FusionResult<BorderDeviceDetail> {
        let envelope: BorderDeviceEnvelope = self
            .get_json(
                "/business/sda/border-device",
                &[("deviceManagementIpAddress", management_ip)],
            )
            .await?;
        Ok(envelope.into_detail())
    }

    async fn get_project(&self, name: &str) -> FusionResult<Project> {
        let projects: Vec<Project> = self
            .get_json("/template-programmer/project", &[("name", name)])
            .await?;
        projects
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| FusionError::NotFound(format!("template project {} not found", name)))
    }

    async fn create_template(
        &self,
        project_id: &str,
        req: &TemplateRequest,
    ) -> FusionResult<TaskRef> {
        let resp: DnacResponse<TaskRef> = self
            .post_json(&format!("/template-programmer/project/{}/template", project_id), req)
            .await?;
        Ok(resp.response)
    }

    async fn update_template(&self, req: &TemplateRequest) -> FusionResult<TaskRef> {
        let resp = self
            .authed(self.client.put(self.api_url("/template-programmer/template")))
            .json(req)
            .send()
            .await?;
        let resp: DnacResponse<TaskRef> = Self::decode(resp).await?;
        Ok(resp.response)
    }

    async fn version_template(&self, template_id: &str, comments: &str) -> FusionResult<TaskRef> {
        let resp: DnacResponse<TaskRef> = self
            .post_json(
                "/template-programmer/template/version",
                &VersionRequest { comments, template_id },
            )
            .await?;
        Ok(resp.response)
    }

    async fn deploy_template(&self, req: &DeployRequest) -> FusionResult<DeployResponse> {
        let raw: serde_json::Value = self
            .post_json("/template-programmer/template/deploy", req)
            .await?;
        let deployment_id = match raw.get("deploymentId") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Ok(DeployResponse { deployment_id, raw })
    }

    async fn deployment_status(
        &self,
        deployment_id: &str,
    ) -> FusionResult<DeploymentStatusResponse> {
        let raw: serde_json::Value = self
            .get_json(
                &format!("/template-programmer/template/deploy/status/{}", deployment_id),
                &[],
            )
            .await?;
        let status = raw
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(DeploymentStatusResponse { status, raw })
    }

    async fn task_status(&self, task_id: &str) -> FusionResult<TaskStatus> {
        let resp: DnacResponse<TaskStatus> =
            self.get_json(&format!("/task/{}", task_id), &[]).await?;
        Ok(resp.response)
    }
}
