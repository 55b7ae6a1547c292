use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Build the controller hostname glob for a declared device-name pattern
/// e.g., "BN-01" -> "BN-01.*"
pub fn hostname_glob(pattern: &str) -> String {
    format!("{}.*", pattern)
}

/// Parse a handoff address as reported by the controller.
/// Host bits are kept in the address; a bare address is treated as a /32.
pub fn parse_handoff_cidr(addr: &str) -> Result<Ipv4Net, String> {
    let addr = addr.trim();
    if addr.contains('/') {
        addr.parse::<Ipv4Net>()
            .map_err(|e| format!("Invalid CIDR {}: {}", addr, e))
    } else {
        let ip: Ipv4Addr = addr
            .parse()
            .map_err(|e| format!("Invalid IPv4 address {}: {}", addr, e))?;
        Ipv4Net::new(ip, 32).map_err(|e| format!("Invalid prefix for {}: {}", addr, e))
    }
}

/// Strip any label the controller prefixes onto a deployment id
/// e.g., "Template Deployemnt Id: 1234..." -> "1234..."
pub fn extract_deployment_id(raw: &str) -> String {
    raw.rsplit(':').next().unwrap_or(raw).trim().to_string()
}

/// Validate the 8-4-4-4-12 hex-group shape of a deployment id.
pub fn is_uuid_shaped(id: &str) -> bool {
    let re = regex_lite::Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    );
    match re {
        Ok(re) => re.is_match(id),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_glob() {
        assert_eq!(hostname_glob("BN-01"), "BN-01.*");
    }

    #[test]
    fn test_parse_handoff_cidr_keeps_host_bits() {
        let net = parse_handoff_cidr("172.16.10.2/30").unwrap();
        assert_eq!(net.addr(), Ipv4Addr::new(172, 16, 10, 2));
        assert_eq!(net.network(), Ipv4Addr::new(172, 16, 10, 0));
        assert_eq!(net.netmask(), Ipv4Addr::new(255, 255, 255, 252));
    }

    #[test]
    fn test_parse_handoff_cidr_bare_address() {
        let net = parse_handoff_cidr("10.1.1.1").unwrap();
        assert_eq!(net.prefix_len(), 32);
        assert_eq!(net.netmask(), Ipv4Addr::new(255, 255, 255, 255));
        assert!(parse_handoff_cidr("10.1.1.300/24").is_err());
        assert!(parse_handoff_cidr("not-an-ip").is_err());
    }

    #[test]
    fn test_extract_deployment_id() {
        assert_eq!(
            extract_deployment_id("Template Deployemnt Id: 0f8fad5b-d9cb-469f-a165-70867728950e"),
            "0f8fad5b-d9cb-469f-a165-70867728950e"
        );
        assert_eq!(extract_deployment_id(" abc123 "), "abc123");
    }

    #[test]
    fn test_is_uuid_shaped() {
        assert!(is_uuid_shaped("0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert!(is_uuid_shaped("0F8FAD5B-D9CB-469F-A165-70867728950E"));
        assert!(!is_uuid_shaped("abc123"));
        assert!(!is_uuid_shaped(""));
        assert!(!is_uuid_shaped("0f8fad5b-d9cb-469f-a165-70867728950"));
        assert!(!is_uuid_shaped("0f8fad5bd9cb-469f-a165-70867728950e0"));
        assert!(!is_uuid_shaped("0f8fad5g-d9cb-469f-a165-70867728950e"));
        assert!(!is_uuid_shaped(" 0f8fad5b-d9cb-469f-a165-70867728950e"));
    }
}
