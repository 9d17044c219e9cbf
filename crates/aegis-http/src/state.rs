use std::sync::Arc;
use std::time::Duration;

use aegis_commons::config::AppConfig;
use aegis_coordinator::Coordinator;
use aegis_db::Gateway;

/// Bounds total per-request runtime at 3 minutes (`spec.md` §5, to
/// accommodate VM boot waits); wraps `start`/`stop` Coordinator calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub gateway: Gateway,
    pub config: Arc<AppConfig>,
}
