use aegis_commons::error::CoreError;
use aegis_commons::models::user::PlanTier;
use aegis_commons::models::usage::UsageCurrent;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::Gateway;

impl Gateway {
    /// Implements `spec.md` §4.6 `GetUsageCurrent`. `billable_seconds` across
    /// the user's current cycle is summed straight out of `usage_records`,
    /// which `upsert_usage_records` keeps current; this call never touches
    /// `sessions` directly.
    pub async fn get_usage_current(&self, user_id: &str) -> Result<UsageCurrent, CoreError> {
        let user_row = sqlx::query(
            "SELECT plan_tier, cycle_start, cycle_end, included_seconds FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_err("get_usage_current/select user"))?
        .ok_or(CoreError::NotFound)?;

        let plan_tier: PlanTier = user_row.try_get("plan_tier").map_err(log_db_err(
            "get_usage_current/decode plan_tier",
        ))?;
        let cycle_start: DateTime<Utc> = user_row.get("cycle_start");
        let cycle_end: DateTime<Utc> = user_row.get("cycle_end");
        let included_seconds: i64 = user_row.get("included_seconds");

        let consumed_seconds: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(billable_seconds), 0) FROM usage_records \
             WHERE user_id = $1 AND cycle_start = $2",
        )
        .bind(user_id)
        .bind(cycle_start)
        .fetch_one(&self.pool)
        .await
        .map_err(log_db_err("get_usage_current/sum usage_records"))?;

        Ok(UsageCurrent::from_totals(
            plan_tier,
            cycle_start,
            cycle_end,
            included_seconds,
            consumed_seconds,
        ))
    }

    /// Implements `spec.md` §4.6 `UpsertUsageRecords`, run periodically by the
    /// scheduler (`spec.md` §5). One set-based upsert covers every session
    /// whose `started_at` falls in the owning user's current billing cycle;
    /// `GREATEST` in the insert body and the `ON CONFLICT` clause keeps
    /// `billable_seconds` monotonic even if a stale rollup races a fresher one.
    /// `overage_seconds` is always written `0` at this layer (`spec.md` §3):
    /// overage is derived at read time in `get_usage_current`, never stored.
    pub async fn upsert_usage_records(&self) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "INSERT INTO usage_records \
             (id, user_id, session_id, measured_seconds, reconciled_seconds, \
              billable_seconds, overage_seconds, cycle_start) \
             SELECT \
                 'use_' || s.id, \
                 s.user_id, \
                 s.id, \
                 s.duration_seconds, \
                 s.reconciled_seconds, \
                 GREATEST(s.duration_seconds, s.reconciled_seconds), \
                 0, \
                 u.cycle_start \
             FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.status IN ('active', 'grace', 'stopped') \
               AND s.started_at >= u.cycle_start \
               AND s.started_at < u.cycle_end \
             ON CONFLICT (id) DO UPDATE SET \
                 measured_seconds = EXCLUDED.measured_seconds, \
                 reconciled_seconds = EXCLUDED.reconciled_seconds, \
                 billable_seconds = GREATEST(usage_records.billable_seconds, EXCLUDED.billable_seconds), \
                 overage_seconds = 0",
        )
        .execute(&self.pool)
        .await
        .map_err(log_db_err("upsert_usage_records"))?;

        Ok(result.rows_affected())
    }
}

fn log_db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(cause = %e, context, "database operation failed");
        CoreError::Internal(e.to_string())
    }
}
