use async_trait::async_trait;
use thiserror::Error;

pub struct ProvisionInput {
    pub session_id: String,
    pub user_id: String,
    pub region: String,
}

pub struct ProvisionedRelay {
    pub aws_instance_id: String,
    pub ami_id: String,
    pub instance_type: String,
    pub public_ip: String,
    pub srt_port: i32,
    pub ws_url: String,
}

pub struct DeprovisionInput {
    pub session_id: String,
    pub user_id: String,
    pub region: String,
    pub aws_instance_id: String,
}

/// An error surfaced by the external provisioner, carrying the raw code
/// used for retry classification (`spec.md` §4.6). `code` is whatever
/// string the provisioner returns, not an enum, since the retryable set is
/// a list of known literals rather than a closed type.
#[derive(Debug, Error, Clone)]
#[error("provisioner error {code}: {message}")]
pub struct ProvisionerError {
    pub code: String,
    pub message: String,
}

impl ProvisionerError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Codes retried by `RetryingProvisioner`. Everything else fails immediately.
pub const TRANSIENT_CODES: &[&str] = &[
    "RequestLimitExceeded",
    "Throttling",
    "ThrottlingException",
    "RequestThrottled",
    "ServiceUnavailable",
    "InternalError",
    "RequestTimeout",
    "EC2ThrottledException",
    "InsufficientInstanceCapacity",
];

/// Codes `Deprovision` treats as already-achieved success.
pub const DEPROVISION_TOLERATED_CODES: &[&str] = &["InvalidInstanceID.NotFound", "IncorrectInstanceState"];

#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, input: ProvisionInput) -> Result<ProvisionedRelay, ProvisionerError>;
    async fn deprovision(&self, input: DeprovisionInput) -> Result<(), ProvisionerError>;
}
