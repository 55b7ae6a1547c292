use std::env;
use std::time::Duration;

use crate::error::{FusionError, FusionResult};

const REQUIRED_KEYS: [&str; 4] = ["DNAC_HOST", "DNAC_USER", "DNAC_PASSWORD", "DNAC_PROJECT_NAME"];

/// Config holds all process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub dnac_host: String,
    pub dnac_user: String,
    pub dnac_password: String,
    pub project_name: String,
    pub template_name: String,
    pub software_type: String,
    pub verify_tls: bool,
    pub request_timeout: Duration,
    pub deploy_poll_interval: Duration,
    pub deploy_max_polls: u32,
    pub task_poll_interval: Duration,
    pub task_max_polls: u32,
    pub template_settle: Duration,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> FusionResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> FusionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| lookup(key).map_or(true, |v| v.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(FusionError::Config(format!(
                "required environment variables not found: {}",
                missing.join(", ")
            )));
        }

        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let secs = |key: &str, default: u64| {
            Duration::from_secs(get(key, "").parse().unwrap_or(default))
        };

        Ok(Self {
            dnac_host: get("DNAC_HOST", ""),
            dnac_user: get("DNAC_USER", ""),
            dnac_password: get("DNAC_PASSWORD", ""),
            project_name: get("DNAC_PROJECT_NAME", ""),
            template_name: get("DNAC_TEMPLATE_NAME", "fusion_router_config"),
            software_type: get("TEMPLATE_SOFTWARE_TYPE", "IOS-XE"),
            verify_tls: parse_bool(&get("DNAC_VERIFY_TLS", "false")),
            request_timeout: secs("DNAC_TIMEOUT_SECS", 30),
            deploy_poll_interval: secs("DEPLOY_POLL_INTERVAL_SECS", 2),
            deploy_max_polls: get("DEPLOY_MAX_POLLS", "300").parse().unwrap_or(300),
            task_poll_interval: secs("TASK_POLL_INTERVAL_SECS", 3),
            task_max_polls: get("TASK_MAX_POLLS", "60").parse().unwrap_or(60),
            template_settle: secs("TEMPLATE_SETTLE_SECS", 3),
        })
    }

    /// Base URL of the controller
    pub fn base_url(&self) -> String {
        if self.dnac_host.starts_with("http://") || self.dnac_host.starts_with("https://") {
            self.dnac_host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.dnac_host.trim_end_matches('/'))
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
