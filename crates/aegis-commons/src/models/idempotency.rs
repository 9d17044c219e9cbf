use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const IDEMPOTENCY_TTL_SECONDS: i64 = 3_600;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IdempotencyRecord {
    pub user_id: String,
    pub endpoint: String,
    pub key: Uuid,
    pub request_hash: String,
    pub response_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
