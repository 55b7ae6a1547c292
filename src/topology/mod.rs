//! Correlates intent device-name patterns with controller-reported devices.

use crate::dnac::{Controller, NetworkDevice};
use crate::error::{FusionError, FusionResult};
use crate::intent::Intent;
use crate::models::{Device, DeviceRole, DeviceType, OrderedMap};

/// Correlated devices keyed by hostname, in controller response order
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: OrderedMap<Device>,
}

impl Inventory {
    pub fn insert(&mut self, device: Device) {
        self.devices.insert(device.hostname.clone(), device);
    }

    #[cfg(test)]
    pub fn get(&self, hostname: &str) -> Option<&Device> {
        self.devices.get(hostname)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn with_role(&self, role: DeviceRole) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(move |d| d.role == role)
    }

    pub fn borders(&self) -> impl Iterator<Item = &Device> {
        self.with_role(DeviceRole::Border)
    }

    /// Deployment target: the first fusion-role device
    pub fn fusion(&self) -> Option<&Device> {
        self.with_role(DeviceRole::Fusion).next()
    }

    /// Distinct {family, series} pairs of every assigned device, in device order
    pub fn device_types(&self) -> Vec<DeviceType> {
        let mut types: Vec<DeviceType> = Vec::new();
        for device in self.devices.values().filter(|d| d.role != DeviceRole::Unassigned) {
            let dt = DeviceType::from(device);
            if !types.contains(&dt) {
                types.push(dt);
            }
        }
        types
    }
}

/// Role by substring match; border patterns take precedence over the fusion pattern.
///
/// In strict mode a hostname matching both kinds of pattern is an error.
pub fn assign_role(hostname: &str, intent: &Intent, strict: bool) -> FusionResult<DeviceRole> {
    let border = intent
        .border_node_patterns
        .iter()
        .find(|p| hostname.contains(p.as_str()));
    let fusion = hostname.contains(intent.fusion_router_pattern.as_str());

    if let (Some(border_pattern), true) = (border, fusion) {
        let candidates = vec![
            format!("BORDER ({})", border_pattern),
            format!("FUSION ({})", intent.fusion_router_pattern),
        ];
        if strict {
            return Err(FusionError::Ambiguous {
                subject: format!("device {}", hostname),
                candidates,
            });
        }
        tracing::warn!("Device {} matches {:?}; classified as BORDER", hostname, candidates);
    }

    Ok(match (border, fusion) {
        (Some(_), _) => DeviceRole::Border,
        (None, true) => DeviceRole::Fusion,
        (None, false) => DeviceRole::Unassigned,
    })
}

fn to_device(raw: NetworkDevice, hostname: String, role: DeviceRole) -> Device {
    Device {
        hostname,
        management_ip: raw.management_ip_address,
        uuid: raw.id,
        series: raw.series.unwrap_or_default(),
        family: raw.family.unwrap_or_default(),
        role,
    }
}

/// Query the controller for the intent's devices and assign each a role.
/// An empty controller response yields an empty inventory.
pub async fn correlate(
    controller: &dyn Controller,
    intent: &Intent,
    strict: bool,
) -> FusionResult<Inventory> {
    tracing::info!("Collecting device info...");
    let raw_devices = controller.list_devices(&intent.hostname_globs()).await?;
    tracing::info!("Got {} devices", raw_devices.len());

    let mut inventory = Inventory::default();
    for raw in raw_devices {
        let hostname = match &raw.hostname {
            Some(h) if !h.is_empty() => h.clone(),
            _ => {
                tracing::debug!("Skipping device {} without hostname", raw.id);
                continue;
            }
        };
        let role = assign_role(&hostname, intent, strict)?;
        if role == DeviceRole::Unassigned {
            tracing::debug!("Device {} matches no intent pattern", hostname);
        }
        inventory.insert(to_device(raw, hostname, role));
    }

    if inventory.is_empty() {
        tracing::warn!("No controller device matched the intent patterns");
    } else {
        tracing::info!("Correlated {} devices", inventory.len());
    }
    if inventory.borders().next().is_none() {
        tracing::warn!("No border devices matched the intent");
    }
    if inventory.fusion().is_none() {
        tracing::warn!("No fusion router matched the intent");
    }
    Ok(inventory)
}
