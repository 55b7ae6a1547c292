use serde::{Deserialize, Serialize};

/// Role a controller device plays in the fusion handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceRole {
    Border,
    Fusion,
    Unassigned,
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceRole::Border => "BORDER",
            DeviceRole::Fusion => "FUSION",
            DeviceRole::Unassigned => "UNASSIGNED",
        };
        f.write_str(s)
    }
}

/// Device represents a controller-managed device matched against the intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub hostname: String,
    pub management_ip: String,
    pub uuid: String,
    pub series: String,
    pub family: String,
    pub role: DeviceRole,
}

/// Applicable device type for a controller template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceType {
    #[serde(rename = "productFamily")]
    pub family: String,
    #[serde(rename = "productSeries")]
    pub series: String,
}

impl From<&Device> for DeviceType {
    fn from(device: &Device) -> Self {
        Self {
            family: device.family.clone(),
            series: device.series.clone(),
        }
    }
}
