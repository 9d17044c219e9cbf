use aegis_commons::error::CoreError;
use chrono::{DateTime, Utc};

use super::Gateway;

impl Gateway {
    /// Implements `spec.md` §4.6 `RollupSessionDurations`: advances
    /// `duration_seconds` for every session still in `active`/`grace` to the
    /// wall-clock elapsed since `started_at`. `GREATEST` makes this safe to
    /// run concurrently with `reconcile_outages`, which can also push
    /// `duration_seconds` forward.
    pub async fn rollup_session_durations(&self, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "UPDATE sessions SET duration_seconds = GREATEST( \
                 duration_seconds, \
                 floor(extract(epoch from ($1::timestamptz - started_at)))::bigint \
             ) WHERE status IN ('active', 'grace')",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(log_db_err("rollup_session_durations"))?;

        Ok(result.rows_affected())
    }

    /// Implements `spec.md` §4.6 `ReconcileOutages`: folds each session's
    /// most recent `RelayHealthEvent.session_uptime_seconds` sample into
    /// `reconciled_seconds`, so a relay that briefly lost its health-report
    /// path still has its real runtime counted once it recovers or is
    /// terminated.
    pub async fn reconcile_outages(&self) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "WITH latest AS ( \
                 SELECT DISTINCT ON (session_id) session_id, session_uptime_seconds \
                 FROM relay_health_events \
                 ORDER BY session_id, observed_at DESC, id DESC \
             ) \
             UPDATE sessions s SET \
                 reconciled_seconds = GREATEST(s.reconciled_seconds, latest.session_uptime_seconds), \
                 duration_seconds = GREATEST(s.duration_seconds, latest.session_uptime_seconds) \
             FROM latest \
             WHERE s.id = latest.session_id AND s.status IN ('active', 'grace', 'stopped')",
        )
        .execute(&self.pool)
        .await
        .map_err(log_db_err("reconcile_outages"))?;

        Ok(result.rows_affected())
    }

    /// Implements `spec.md` §4.3's idempotency TTL: purges expired
    /// `IdempotencyRecord` rows so the table doesn't grow unbounded.
    pub async fn gc_idempotency_records(&self, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM idempotency_records WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(log_db_err("gc_idempotency_records"))?;

        Ok(result.rows_affected())
    }
}

fn log_db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(cause = %e, context, "database operation failed");
        CoreError::Internal(e.to_string())
    }
}
