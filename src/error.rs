use thiserror::Error;

/// Errors raised by the provisioning pipeline.
///
/// Deployment outcomes (failure, timeout, malformed id) are not errors; they
/// are carried by [`crate::models::DeploymentTask`].
#[derive(Debug, Error)]
pub enum FusionError {
    /// Missing or invalid process settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Intent file could not be read or failed validation
    #[error("intent file error: {0}")]
    Intent(String),

    /// Initial controller connection/authentication failed
    #[error("failed to connect to DNA Center at {host}: {reason}")]
    Connect { host: String, reason: String },

    /// Controller answered with a non-success status
    #[error("DNA Center API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Controller answered successfully but the request could not be satisfied
    #[error("DNA Center API error: {0}")]
    NotFound(String),

    /// An asynchronous controller task ended in error or never finished
    #[error("DNA Center task {id} failed: {reason}")]
    Task { id: String, reason: String },

    /// Deployment requested for a template without a committed version
    #[error("template {0} has no committed version")]
    Unversioned(String),

    /// Border handoff data could not be normalized
    #[error("invalid handoff data for {device}: {reason}")]
    Handoff { device: String, reason: String },

    /// Transport-level failure after connecting
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A configuration block template failed to parse or render
    #[error("template rendering failed: {0}")]
    Render(#[from] tera::Error),

    /// More than one candidate matched while running in strict mode
    #[error("ambiguous match for {subject}: {candidates:?}")]
    Ambiguous {
        subject: String,
        candidates: Vec<String>,
    },

    /// Confirmation gate could not read an answer
    #[error("confirmation prompt failed: {0}")]
    Prompt(String),

    /// Interrupted by the operator while waiting on the controller
    #[error("operation cancelled")]
    Cancelled,
}

pub type FusionResult<T> = Result<T, FusionError>;
