use std::future::Future;
use std::time::{Duration, Instant};

use aegis_db::Gateway;
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runs `job` once immediately, then every `interval`, until `shutdown` is
/// cancelled. Every run is instrumented with `aegis_job_runs_total{job,status}`
/// and `aegis_job_duration_ms{job}` (`spec.md` §4.5).
pub async fn run_periodic<F, Fut>(
    name: &'static str,
    interval: Duration,
    shutdown: CancellationToken,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), aegis_commons::error::CoreError>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => {
                tracing::info!(job = name, "scheduler job shutting down");
                return;
            }
        }

        let started = Instant::now();
        let result = job().await;
        let status = if result.is_ok() { "ok" } else { "error" };

        aegis_metrics::global().increment_counter("aegis_job_runs_total", &[("job", name), ("status", status)]);
        aegis_metrics::global().observe_histogram(
            "aegis_job_duration_ms",
            &[("job", name)],
            started.elapsed().as_millis() as f64,
        );

        if let Err(e) = result {
            tracing::error!(job = name, cause = %e, "scheduler job failed");
        }
    }
}

pub async fn idempotency_ttl_cleanup(gateway: Gateway) -> Result<(), aegis_commons::error::CoreError> {
    let deleted = gateway.gc_idempotency_records(Utc::now()).await?;
    tracing::debug!(deleted, "idempotency_ttl_cleanup ran");
    Ok(())
}

pub async fn session_usage_rollup(gateway: Gateway) -> Result<(), aegis_commons::error::CoreError> {
    let updated = gateway.rollup_session_durations(Utc::now()).await?;
    tracing::debug!(updated, "session_usage_rollup advanced durations");
    let upserted = gateway.upsert_usage_records().await?;
    tracing::debug!(upserted, "session_usage_rollup upserted usage records");
    Ok(())
}

pub async fn outage_reconciliation(gateway: Gateway) -> Result<(), aegis_commons::error::CoreError> {
    let reconciled = gateway.reconcile_outages().await?;
    tracing::debug!(reconciled, "outage_reconciliation folded health samples");
    let upserted = gateway.upsert_usage_records().await?;
    tracing::debug!(upserted, "outage_reconciliation upserted usage records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_stops_on_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();

        let handle = {
            let runs = runs.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                run_periodic("test_job", Duration::from_secs(60), shutdown, move || {
                    let runs = runs.clone();
                    async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await
            })
        };

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
