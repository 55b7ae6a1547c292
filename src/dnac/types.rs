use serde::{Deserialize, Deserializer, Serialize};

use crate::models::DeviceType;

// --- DNA Center API types ---

#[derive(Debug, Deserialize)]
pub struct DnacResponse<T> {
    pub response: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthToken {
    #[serde(rename = "Token")]
    pub token: String,
}

/// Numbers the controller reports either as JSON numbers or numeric strings
#[derive(Deserialize)]
#[serde(untagged)]
enum FlexNumber {
    Num(u64),
    Str(String),
}

fn de_flex_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let value = match FlexNumber::deserialize(deserializer)? {
        FlexNumber::Num(n) => n,
        FlexNumber::Str(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {:?}", s)))?,
    };
    T::try_from(value)
        .map_err(|_| serde::de::Error::custom(format!("number {} out of range", value)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDevice {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub management_ip_address: String,
    pub id: String,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
}

/// Border detail is returned either bare or inside a `payload` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BorderDeviceEnvelope {
    Wrapped { payload: BorderDeviceDetail },
    Bare(BorderDeviceDetail),
}

impl BorderDeviceEnvelope {
    pub fn into_detail(self) -> BorderDeviceDetail {
        match self {
            Self::Wrapped { payload } => payload,
            Self::Bare(detail) => detail,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderDeviceDetail {
    pub name: String,
    pub device_settings: DeviceSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    #[serde(deserialize_with = "de_flex_number")]
    pub internal_domain_protocol_number: u32,
    #[serde(default)]
    pub ext_connectivity_settings: Vec<ExtConnectivity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtConnectivity {
    #[serde(deserialize_with = "de_flex_number")]
    pub external_domain_protocol_number: u32,
    #[serde(default, rename = "l3Handoff")]
    pub l3_handoff: Vec<L3Handoff>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L3Handoff {
    #[serde(deserialize_with = "de_flex_number")]
    pub vlan_id: u16,
    pub local_ip_address: String,
    pub remote_ip_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub templates: Vec<ProjectTemplate>,
}

impl Project {
    pub fn template_id(&self, name: &str) -> Option<&str> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTemplate {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeployResponse {
    /// Raw `deploymentId` field; may carry a label prefix or an error text
    pub deployment_id: String,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct DeploymentStatusResponse {
    pub status: String,
    pub raw: serde_json::Value,
}

// --- Request types ---

#[derive(Debug, Clone, Serialize)]
pub struct TemplatePayload {
    #[serde(rename = "templateContent")]
    pub template_content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub project_id: String,
    pub software_type: String,
    pub device_types: Vec<DeviceType>,
    pub payload: TemplatePayload,
    pub version: String,
    pub language: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionRequest<'a> {
    pub comments: &'a str,
    pub template_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub template_id: String,
    pub target_info: Vec<TargetInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub params: TargetParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetParams {
    pub device_ip: String,
}

impl DeployRequest {
    /// Deploy request naming the target by management IP
    pub fn for_device_ip(template_id: &str, ip: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            target_info: vec![TargetInfo {
                id: ip.to_string(),
                target_type: "MANAGED_DEVICE_IP".to_string(),
                params: TargetParams {
                    device_ip: ip.to_string(),
                },
            }],
        }
    }
}
