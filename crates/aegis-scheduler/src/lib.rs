mod jobs;

use std::time::Duration;

use aegis_db::Gateway;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const IDEMPOTENCY_TTL_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);
const SESSION_USAGE_ROLLUP_INTERVAL: Duration = Duration::from_secs(60);
const OUTAGE_RECONCILIATION_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Starts the periodic jobs from `spec.md` §4.5 as independent long-lived
/// tasks, each ticking once immediately and then on a fixed interval until
/// `shutdown` is cancelled. Usage-record upserts have no interval of their
/// own in the spec's job table (it lists a dash) and instead run inline from
/// `session_usage_rollup` and `outage_reconciliation`, so three tick loops
/// cover all four jobs. Grounded on `kftray-portforward/src/kube/start.rs`'s
/// timeout-callback background task pattern, generalized to process-wide
/// interval loops instead of one per-forward timer.
pub fn spawn_jobs(gateway: Gateway, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(jobs::run_periodic(
            "idempotency_ttl_cleanup",
            IDEMPOTENCY_TTL_CLEANUP_INTERVAL,
            shutdown.clone(),
            {
                let gateway = gateway.clone();
                move || jobs::idempotency_ttl_cleanup(gateway.clone())
            },
        )),
        tokio::spawn(jobs::run_periodic(
            "session_usage_rollup",
            SESSION_USAGE_ROLLUP_INTERVAL,
            shutdown.clone(),
            {
                let gateway = gateway.clone();
                move || jobs::session_usage_rollup(gateway.clone())
            },
        )),
        tokio::spawn(jobs::run_periodic(
            "outage_reconciliation",
            OUTAGE_RECONCILIATION_INTERVAL,
            shutdown,
            {
                let gateway = gateway.clone();
                move || jobs::outage_reconciliation(gateway.clone())
            },
        )),
    ]
}
