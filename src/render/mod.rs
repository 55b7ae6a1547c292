//! Block templates for the fusion router configuration.
//!
//! Four independent templates, one per block kind. Each renders a single
//! serializable record to text; separators between blocks belong to the
//! synthesizer.

use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

use crate::error::FusionResult;
use crate::models::BorderLink;

pub const VRF: &str = "vrf";
pub const VLAN_INTERFACE: &str = "vlan_interface";
pub const BGP_PEER: &str = "bgp_peer";
pub const BGP_PROCESS: &str = "bgp";

const DEFAULT_VRF: &str = r#"vrf definition {{ vrf_name }}
 rd {{ rd }}
 !
 address-family ipv4
{%- for rt in import_rt %}
  route-target import {{ rt }}
{%- endfor %}
  route-target export {{ rd }}
 exit-address-family"#;

const DEFAULT_VLAN_INTERFACE: &str = r#"vlan {{ vlan_id }}
!
interface Vlan{{ vlan_id }}
{%- if vrf_name %}
 vrf forwarding {{ vrf_name }}
{%- endif %}
 ip address {{ local_ip }} {{ local_netmask }}
 no shutdown"#;

const DEFAULT_BGP_PEER: &str = r#"  neighbor {{ remote_ip }} remote-as {{ remote_as }}
  neighbor {{ remote_ip }} activate"#;

const DEFAULT_BGP_PROCESS: &str = r#"router bgp {{ local_as }}
 bgp log-neighbor-changes
{%- for vrf in bgp_vrfs %}
 !
 address-family ipv4 vrf {{ vrf.name }}
{%- for peer in vrf.peers %}
{{ peer }}
{%- endfor %}
 exit-address-family
{%- endfor %}"#;

/// Input record for a VRF block
#[derive(Debug, Serialize)]
pub struct VrfBlock<'a> {
    pub vrf_name: &'a str,
    pub rd: &'a str,
    pub import_rt: &'a [String],
}

/// Rendered peer fragments of one VRF
#[derive(Debug, Serialize)]
pub struct BgpVrfGroup {
    pub name: String,
    pub peers: Vec<String>,
}

/// Input record for the BGP process block
#[derive(Debug, Serialize)]
pub struct BgpProcess<'a> {
    pub local_as: Option<u32>,
    pub bgp_vrfs: &'a [BgpVrfGroup],
}

/// BlockRenderer holds the four block templates
pub struct BlockRenderer {
    tera: Tera,
}

impl BlockRenderer {
    /// Renderer with the built-in IOS-XE templates
    pub fn builtin() -> FusionResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (VRF, DEFAULT_VRF),
            (VLAN_INTERFACE, DEFAULT_VLAN_INTERFACE),
            (BGP_PEER, DEFAULT_BGP_PEER),
            (BGP_PROCESS, DEFAULT_BGP_PROCESS),
        ])?;
        Ok(Self { tera })
    }

    /// Built-in templates overridden by `<name>.tera` files found in `dir`
    pub fn with_overrides(dir: &Path) -> FusionResult<Self> {
        let mut renderer = Self::builtin()?;
        for name in [VRF, VLAN_INTERFACE, BGP_PEER, BGP_PROCESS] {
            let path = dir.join(format!("{}.tera", name));
            if path.is_file() {
                tracing::info!("Using template override {}", path.display());
                renderer.tera.add_template_file(&path, Some(name))?;
            }
        }
        Ok(renderer)
    }

    fn render<T: Serialize>(&self, name: &str, record: &T) -> FusionResult<String> {
        let context = Context::from_serialize(record)?;
        let text = self.tera.render(name, &context)?;
        Ok(text.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn vrf(&self, block: &VrfBlock<'_>) -> FusionResult<String> {
        self.render(VRF, block)
    }

    pub fn vlan_interface(&self, link: &BorderLink) -> FusionResult<String> {
        self.render(VLAN_INTERFACE, link)
    }

    pub fn bgp_peer(&self, link: &BorderLink) -> FusionResult<String> {
        self.render(BGP_PEER, link)
    }

    pub fn bgp_process(&self, process: &BgpProcess<'_>) -> FusionResult<String> {
        self.render(BGP_PROCESS, process)
    }
}
