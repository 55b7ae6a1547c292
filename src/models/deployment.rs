use chrono::{DateTime, Utc};
use serde::Serialize;

/// Deployment status as tracked by the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentStatus {
    Pending,
    Success,
    Failure,
    /// Controller returned a deployment id that is not UUID-shaped
    Malformed,
    /// Poll budget exhausted before a terminal controller status
    Timeout,
}

impl DeploymentStatus {
    /// Map a controller status string; only SUCCESS and FAILURE are terminal
    pub fn from_controller(status: &str) -> Self {
        match status {
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Malformed => "MALFORMED",
            Self::Timeout => "TIMEOUT",
        };
        f.write_str(s)
    }
}

/// DeploymentTask is created when the deploy call returns and is only
/// mutated by the poller afterwards
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentTask {
    pub deployment_id: String,
    pub status: DeploymentStatus,
    /// Last payload received from the controller (deploy or status response)
    pub detail: serde_json::Value,
    pub polls: u32,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl DeploymentTask {
    /// Build the task from the deploy response; a non-UUID id is terminal
    pub fn from_deploy_response(raw_id: &str, response: serde_json::Value) -> Self {
        let deployment_id = crate::utils::extract_deployment_id(raw_id);
        let malformed = !crate::utils::is_uuid_shaped(&deployment_id);
        let now = Utc::now();
        Self {
            deployment_id,
            status: if malformed {
                DeploymentStatus::Malformed
            } else {
                DeploymentStatus::Pending
            },
            detail: response,
            polls: 0,
            started_at: now,
            finished_at: malformed.then_some(now),
        }
    }

    /// Apply one poll result; ignored once terminal
    pub fn record_poll(&mut self, status: DeploymentStatus, detail: serde_json::Value) {
        if self.status.is_terminal() {
            return;
        }
        self.polls += 1;
        self.status = status;
        self.detail = detail;
        if status.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn mark_timeout(&mut self) {
        if !self.status.is_terminal() {
            self.status = DeploymentStatus::Timeout;
            self.finished_at = Some(Utc::now());
        }
    }
}
