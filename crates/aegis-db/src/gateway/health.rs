use aegis_commons::error::CoreError;
use aegis_commons::models::ids::{RelayInstanceId, SessionId};
use chrono::{DateTime, Utc};

use super::Gateway;

pub struct RecordHealthInput {
    pub session_id: SessionId,
    pub observed_at: DateTime<Utc>,
    pub ingest_active: bool,
    pub egress_active: bool,
    pub session_uptime_seconds: i64,
    pub payload_json: serde_json::Value,
}

impl Gateway {
    /// Implements `spec.md` §4.4 `RecordRelayHealth`. The insert and the
    /// session/relay-instance lookup happen in one statement so a health
    /// sample for an unknown or deprovisioned session is rejected outright
    /// rather than landing as an orphan row.
    pub async fn record_relay_health(&self, input: RecordHealthInput) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(log_db_err("record_relay_health/begin"))?;

        let relay_instance_id: Option<RelayInstanceId> = sqlx::query_scalar(
            "INSERT INTO relay_health_events \
             (session_id, relay_instance_id, observed_at, ingest_active, egress_active, \
              session_uptime_seconds, payload_json) \
             SELECT id, relay_instance_id, $2, $3, $4, $5, $6 \
             FROM sessions WHERE id = $1 AND relay_instance_id IS NOT NULL \
             RETURNING relay_instance_id",
        )
        .bind(&input.session_id)
        .bind(input.observed_at)
        .bind(input.ingest_active)
        .bind(input.egress_active)
        .bind(input.session_uptime_seconds)
        .bind(&input.payload_json)
        .fetch_optional(&mut *tx)
        .await
        .map_err(log_db_err("record_relay_health/insert"))?;

        let Some(relay_instance_id) = relay_instance_id else {
            tracing::warn!(
                session_id = %input.session_id,
                "relay health event rejected: no active relay instance for session"
            );
            return Err(CoreError::RelayHealthRejected);
        };

        sqlx::query("UPDATE relay_instances SET last_health_at = $1 WHERE id = $2")
            .bind(input.observed_at)
            .bind(&relay_instance_id)
            .execute(&mut *tx)
            .await
            .map_err(log_db_err("record_relay_health/update relay_instance"))?;

        tx.commit()
            .await
            .map_err(log_db_err("record_relay_health/commit"))?;
        Ok(())
    }
}

fn log_db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(cause = %e, context, "database operation failed");
        CoreError::Internal(e.to_string())
    }
}
