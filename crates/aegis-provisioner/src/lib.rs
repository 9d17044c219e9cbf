pub mod http;
pub mod retry;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use http::HttpProvisioner;
pub use retry::RetryingProvisioner;
pub use types::{
    DeprovisionInput, ProvisionInput, ProvisionedRelay, Provisioner, ProvisionerError,
};
