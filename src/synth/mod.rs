//! Deterministic rendering of the peer/link/VRF model into configuration text.

use crate::error::FusionResult;
use crate::intent::Vrf;
use crate::links::PeerTable;
use crate::render::{BgpProcess, BgpVrfGroup, BlockRenderer, VrfBlock};

/// Literal separator placed between consecutive blocks
pub const SEPARATOR: &str = "\r\n!\r\n";

/// Configuration section; sections are emitted in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Vrf,
    Vlan,
    Bgp,
}

/// ConfigBlock is one rendered text fragment tagged with its section
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigBlock {
    pub section: Section,
    pub text: String,
}

impl ConfigBlock {
    fn new(section: Section, text: String) -> Self {
        Self { section, text }
    }
}

/// Group links by VRF in first-seen order; VRF-less links are left out
pub fn group_peers_by_vrf(
    peers: &PeerTable,
    renderer: &BlockRenderer,
) -> FusionResult<Vec<BgpVrfGroup>> {
    let mut groups: Vec<BgpVrfGroup> = Vec::new();
    for peer in peers.values() {
        for link in &peer.links {
            let Some(vrf_name) = link.vrf_name.as_deref() else {
                continue;
            };
            let fragment = renderer.bgp_peer(link)?;
            match groups.iter_mut().find(|g| g.name == vrf_name) {
                Some(group) => group.peers.push(fragment),
                None => groups.push(BgpVrfGroup {
                    name: vrf_name.to_string(),
                    peers: vec![fragment],
                }),
            }
        }
    }
    Ok(groups)
}

/// Local AS for the BGP process: the first peer that reported a transit
pub fn local_as(peers: &PeerTable) -> Option<u32> {
    peers.values().find_map(|p| p.local_as)
}

/// Render every block: VRFs in declaration order, one VLAN interface per
/// link in peer then link order, and a single BGP process block.
pub fn build_blocks(
    peers: &PeerTable,
    vrfs: &[Vrf],
    renderer: &BlockRenderer,
) -> FusionResult<Vec<ConfigBlock>> {
    let mut blocks = Vec::new();

    for vrf in vrfs {
        let text = renderer.vrf(&VrfBlock {
            vrf_name: &vrf.name,
            rd: &vrf.route_distinguisher,
            import_rt: &vrf.import_targets,
        })?;
        blocks.push(ConfigBlock::new(Section::Vrf, text));
    }

    for peer in peers.values() {
        for link in &peer.links {
            blocks.push(ConfigBlock::new(Section::Vlan, renderer.vlan_interface(link)?));
        }
    }

    let local_as = local_as(peers);
    if local_as.is_none() {
        tracing::warn!("No border reported a local AS; the BGP process block has no AS number");
    }
    let groups = group_peers_by_vrf(peers, renderer)?;
    let bgp = renderer.bgp_process(&BgpProcess {
        local_as,
        bgp_vrfs: &groups,
    })?;
    blocks.push(ConfigBlock::new(Section::Bgp, bgp));

    Ok(blocks)
}

/// Join blocks into the final text: VRF blocks, separator, VLAN blocks,
/// separator, BGP block. Blocks are ordered by section first, so the
/// result never depends on the order they were passed in across sections.
pub fn assemble(blocks: &[ConfigBlock]) -> String {
    let mut ordered: Vec<&ConfigBlock> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.section);

    let join = |section: Section| -> String {
        ordered
            .iter()
            .filter(|b| b.section == section)
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    };

    let mut text = join(Section::Vrf);
    text.push_str(SEPARATOR);
    text.push_str(&join(Section::Vlan));
    text.push_str(SEPARATOR);
    text.push_str(&join(Section::Bgp));
    text
}

/// Pure transformation from the correlated model to configuration text
pub fn synthesize(
    peers: &PeerTable,
    vrfs: &[Vrf],
    renderer: &BlockRenderer,
) -> FusionResult<String> {
    tracing::info!("Generating fusion router config...");
    let blocks = build_blocks(peers, vrfs, renderer)?;
    let text = assemble(&blocks);
    tracing::info!("Configuration template generated ({} blocks)", blocks.len());
    Ok(text)
}
