mod start;
mod stop;
mod token;

use std::sync::Arc;

use aegis_commons::config::AppConfig;
use aegis_db::Gateway;
use aegis_provisioner::Provisioner;

pub use start::StartRequest;

/// Orchestrates the three public session operations (`spec.md` §4.1) across
/// the gateway and the external provisioner, owning the compensating saga.
/// Grounded on `kftray-portforward/src/kube/start.rs`'s multi-step
/// provisioning-with-cleanup-on-failure shape.
///
/// Every public operation takes an `aegis_commons::context::RequestContext`
/// rather than a bare `user_id`, per `spec.md` §9's "per-request context
/// carrier, not module globals" note; the HTTP layer is the only caller that
/// constructs one, from the request-id middleware plus the authenticated user.
pub struct Coordinator {
    gateway: Gateway,
    provisioner: Arc<dyn Provisioner>,
    config: Arc<AppConfig>,
}

impl Coordinator {
    pub fn new(gateway: Gateway, provisioner: Arc<dyn Provisioner>, config: Arc<AppConfig>) -> Self {
        Self {
            gateway,
            provisioner,
            config,
        }
    }
}
