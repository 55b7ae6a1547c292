//! Normalizes border fabric egress settings into fusion-side link records.

use crate::dnac::{BorderDeviceDetail, Controller, L3Handoff};
use crate::error::{FusionError, FusionResult};
use crate::intent::{Intent, Vrf};
use crate::models::{BorderLink, OrderedMap, PeerRecord};
use crate::topology::Inventory;
use crate::utils::parse_handoff_cidr;

/// Connectivity entries consumed per border; only one IP transit is supported
pub const TRANSIT_LIMIT: usize = 1;

/// Peer records keyed by border device name, in processing order
pub type PeerTable = OrderedMap<PeerRecord>;

/// First VRF (declaration order) that declares the VLAN.
///
/// In strict mode a VLAN declared by several VRFs is an error.
pub fn resolve_vrf<'a>(
    intent: &'a Intent,
    vlan_id: u16,
    strict: bool,
) -> FusionResult<Option<&'a Vrf>> {
    let candidates = intent.vrfs_for_vlan(vlan_id);
    if candidates.len() > 1 {
        let names: Vec<String> = candidates.iter().map(|v| v.name.clone()).collect();
        if strict {
            return Err(FusionError::Ambiguous {
                subject: format!("VLAN {}", vlan_id),
                candidates: names,
            });
        }
        tracing::warn!("VLAN {} is declared by {:?}; using {}", vlan_id, names, names[0]);
    }
    Ok(candidates.into_iter().next())
}

/// Build the fusion-side link for one handoff.
///
/// The controller reports addresses from the border's perspective: its
/// "remote" address is the fusion router's local address and vice versa.
pub fn link_from_handoff(
    device: &str,
    handoff: &L3Handoff,
    remote_as: u32,
    intent: &Intent,
    strict: bool,
) -> FusionResult<BorderLink> {
    let invalid = |reason: String| FusionError::Handoff {
        device: device.to_string(),
        reason,
    };
    let local = parse_handoff_cidr(&handoff.remote_ip_address).map_err(invalid)?;
    let remote = parse_handoff_cidr(&handoff.local_ip_address).map_err(invalid)?;

    let vrf = resolve_vrf(intent, handoff.vlan_id, strict)?;

    Ok(BorderLink {
        remote_as,
        network: local.network(),
        local_ip: local.addr(),
        local_netmask: local.netmask(),
        remote_ip: remote.addr(),
        remote_netmask: remote.netmask(),
        vlan_id: handoff.vlan_id,
        vrf_name: vrf.map(|v| v.name.clone()),
        route_distinguisher: vrf.map(|v| v.route_distinguisher.clone()),
        import_targets: vrf.map(|v| v.import_targets.clone()),
    })
}

/// Normalize one border's detail record into a peer record
pub fn peer_from_detail(
    detail: &BorderDeviceDetail,
    intent: &Intent,
    strict: bool,
) -> FusionResult<PeerRecord> {
    let settings = &detail.device_settings;
    let mut peer = PeerRecord::new(detail.name.clone());

    let transits = &settings.ext_connectivity_settings;
    if transits.len() > TRANSIT_LIMIT {
        tracing::warn!(
            "{} reports {} IP transits; only the first {} is used",
            detail.name,
            transits.len(),
            TRANSIT_LIMIT
        );
    }

    let Some(transit) = transits.first() else {
        tracing::warn!("{} has no external connectivity configured", detail.name);
        return Ok(peer);
    };

    peer.local_as = Some(transit.external_domain_protocol_number);
    for handoff in &transit.l3_handoff {
        let link = link_from_handoff(
            &detail.name,
            handoff,
            settings.internal_domain_protocol_number,
            intent,
            strict,
        )?;
        if link.vrf_name.is_none() {
            tracing::debug!("{} VLAN {} has no VRF in the intent", detail.name, link.vlan_id);
        }
        peer.links.push(link);
    }
    Ok(peer)
}

/// Fetch and normalize the border detail of every border-role device.
pub async fn extract(
    controller: &dyn Controller,
    inventory: &Inventory,
    intent: &Intent,
    strict: bool,
) -> FusionResult<PeerTable> {
    tracing::info!("Collecting border node configs...");
    let mut peers = PeerTable::new();
    for device in inventory.borders() {
        let detail = controller.border_device_detail(&device.management_ip).await?;
        let peer = peer_from_detail(&detail, intent, strict)?;
        tracing::info!("{}: {} handoff links", peer.name, peer.links.len());
        peers.insert(peer.name.clone(), peer);
    }
    Ok(peers)
}
