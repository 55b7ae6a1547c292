use serde::Serialize;
use std::net::Ipv4Addr;

/// One L3 handoff link, seen from the fusion router's side.
///
/// VRF fields are `None` when no intent VRF declares the link's VLAN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderLink {
    pub remote_as: u32,
    pub network: Ipv4Addr,
    pub local_ip: Ipv4Addr,
    pub local_netmask: Ipv4Addr,
    pub remote_ip: Ipv4Addr,
    pub remote_netmask: Ipv4Addr,
    pub vlan_id: u16,
    pub vrf_name: Option<String>,
    #[serde(rename = "rd")]
    pub route_distinguisher: Option<String>,
    #[serde(rename = "import_rt")]
    pub import_targets: Option<Vec<String>>,
}

/// PeerRecord aggregates the handoff links of one border node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerRecord {
    pub name: String,
    /// External AS of the transit; `None` when the border reports no transit
    pub local_as: Option<u32>,
    pub links: Vec<BorderLink>,
}

impl PeerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_as: None,
            links: Vec::new(),
        }
    }
}
