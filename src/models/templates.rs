use serde::Serialize;

use super::DeviceType;

/// Lifecycle of the controller template within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateState {
    Absent,
    Created,
    Versioned,
}

/// TemplateRecord tracks the fusion config template on the controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateRecord {
    /// Absent until the template is first created
    pub id: Option<String>,
    pub name: String,
    pub project_id: String,
    pub device_types: Vec<DeviceType>,
    pub payload: String,
    pub version: Option<String>,
    pub state: TemplateState,
}

impl TemplateRecord {
    /// Template ready for deployment: created and with a committed version
    pub fn deployable_id(&self) -> Option<&str> {
        match self.state {
            TemplateState::Versioned => self.id.as_deref(),
            _ => None,
        }
    }
}
