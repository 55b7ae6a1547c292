//! Declarative intent: which devices to correlate and which VRFs to stitch.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{FusionError, FusionResult};

/// Intent as loaded from the intent file
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub border_node_patterns: Vec<String>,
    pub fusion_router_pattern: String,
    /// VRFs in declaration order
    pub vrfs: Vec<Vrf>,
}

/// A VRF declared in the intent file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vrf {
    pub name: String,
    pub route_distinguisher: String,
    pub vlans: Vec<u16>,
    pub import_targets: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IntentFile {
    border_nodes: Vec<String>,
    fusion_router: String,
    vrfs: VrfTable,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VrfDef {
    rd: String,
    vlans: Vec<u16>,
    import: Vec<String>,
}

/// Mapping of VRF name to definition that keeps file order
#[derive(Debug)]
struct VrfTable(Vec<Vrf>);

impl<'de> Deserialize<'de> for VrfTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = VrfTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of VRF name to {rd, vlans, import}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<VrfTable, A::Error> {
                let mut vrfs: Vec<Vrf> = Vec::new();
                while let Some((name, def)) = map.next_entry::<String, VrfDef>()? {
                    if vrfs.iter().any(|v| v.name == name) {
                        return Err(serde::de::Error::custom(format!("duplicate VRF {}", name)));
                    }
                    vrfs.push(Vrf {
                        name,
                        route_distinguisher: def.rd,
                        vlans: def.vlans,
                        import_targets: def.import,
                    });
                }
                Ok(VrfTable(vrfs))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

impl Intent {
    /// Read, parse and validate the intent file
    pub fn load(path: &Path, strict: bool) -> FusionResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FusionError::Intent(format!("cannot read {}: {}", path.display(), e)))?;
        let intent = Self::from_yaml_str(&raw)?;
        intent.validate(strict)?;
        Ok(intent)
    }

    /// Parse the YAML form without semantic validation
    pub fn from_yaml_str(raw: &str) -> FusionResult<Self> {
        let file: IntentFile =
            serde_yaml::from_str(raw).map_err(|e| FusionError::Intent(e.to_string()))?;

        let mut border_node_patterns: Vec<String> = Vec::new();
        for pattern in file.border_nodes {
            if !border_node_patterns.contains(&pattern) {
                border_node_patterns.push(pattern);
            }
        }

        Ok(Self {
            border_node_patterns,
            fusion_router_pattern: file.fusion_router,
            vrfs: file.vrfs.0,
        })
    }

    /// Semantic checks; overlapping VLANs only fail in strict mode
    pub fn validate(&self, strict: bool) -> FusionResult<()> {
        if self.border_node_patterns.is_empty() {
            return Err(FusionError::Intent("border_nodes must list at least one device".into()));
        }
        if self.border_node_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(FusionError::Intent("border_nodes entries must not be empty".into()));
        }
        if self.fusion_router_pattern.trim().is_empty() {
            return Err(FusionError::Intent("fusion_router must not be empty".into()));
        }
        for vrf in &self.vrfs {
            if vrf.route_distinguisher.trim().is_empty() {
                return Err(FusionError::Intent(format!("VRF {} has an empty rd", vrf.name)));
            }
            if let Some(bad) = vrf.vlans.iter().find(|v| !(1..=4094).contains(*v)) {
                return Err(FusionError::Intent(format!(
                    "VRF {} declares VLAN {} outside 1-4094",
                    vrf.name, bad
                )));
            }
        }

        for (vlan, owners) in self.vlan_overlaps() {
            if strict {
                return Err(FusionError::Ambiguous {
                    subject: format!("VLAN {}", vlan),
                    candidates: owners,
                });
            }
            tracing::warn!(
                "VLAN {} is declared by several VRFs {:?}; {} wins",
                vlan,
                owners,
                owners[0]
            );
        }
        Ok(())
    }

    /// Every VRF declaring the VLAN, in declaration order
    pub fn vrfs_for_vlan(&self, vlan_id: u16) -> Vec<&Vrf> {
        self.vrfs.iter().filter(|v| v.vlans.contains(&vlan_id)).collect()
    }

    /// VLANs declared by more than one VRF, with the owning VRF names
    pub fn vlan_overlaps(&self) -> Vec<(u16, Vec<String>)> {
        let mut seen: Vec<u16> = Vec::new();
        let mut overlaps = Vec::new();
        for vrf in &self.vrfs {
            for vlan in &vrf.vlans {
                if seen.contains(vlan) {
                    continue;
                }
                seen.push(*vlan);
                let owners: Vec<String> = self
                    .vrfs_for_vlan(*vlan)
                    .into_iter()
                    .map(|v| v.name.clone())
                    .collect();
                if owners.len() > 1 {
                    overlaps.push((*vlan, owners));
                }
            }
        }
        overlaps
    }

    /// Hostname globs for the device query: border patterns, then the fusion pattern
    pub fn hostname_globs(&self) -> Vec<String> {
        self.border_node_patterns
            .iter()
            .chain(std::iter::once(&self.fusion_router_pattern))
            .map(|p| crate::utils::hostname_glob(p))
            .collect()
    }
}
