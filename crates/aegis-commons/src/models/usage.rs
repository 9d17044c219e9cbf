use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub measured_seconds: i64,
    pub reconciled_seconds: i64,
    pub billable_seconds: i64,
    pub overage_seconds: i64,
}

impl UsageRecord {
    pub fn new_id(session_id: &str) -> String {
        format!("use_{session_id}")
    }
}

/// Derived at read time from `UsageRecord` rows in the user's current cycle; never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageCurrent {
    pub plan_tier: crate::models::user::PlanTier,
    pub cycle_start: chrono::DateTime<chrono::Utc>,
    pub cycle_end: chrono::DateTime<chrono::Utc>,
    pub included_seconds: i64,
    pub consumed_seconds: i64,
    pub remaining_seconds: i64,
    pub overage_seconds: i64,
}

impl UsageCurrent {
    pub fn from_totals(
        plan_tier: crate::models::user::PlanTier,
        cycle_start: chrono::DateTime<chrono::Utc>,
        cycle_end: chrono::DateTime<chrono::Utc>,
        included_seconds: i64,
        consumed_seconds: i64,
    ) -> Self {
        Self {
            plan_tier,
            cycle_start,
            cycle_end,
            included_seconds,
            consumed_seconds,
            remaining_seconds: (included_seconds - consumed_seconds).max(0),
            overage_seconds: (consumed_seconds - included_seconds).max(0),
        }
    }
}
