use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RelayHealthEvent {
    pub id: i64,
    pub session_id: String,
    pub relay_instance_id: String,
    pub observed_at: DateTime<Utc>,
    pub ingest_active: bool,
    pub egress_active: bool,
    pub session_uptime_seconds: i64,
    pub payload_json: serde_json::Value,
}

/// Inbound shape from the relay-produced heartbeat, before admission.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayHealthInput {
    pub session_id: String,
    pub observed_at: Option<String>,
    pub ingest_active: bool,
    pub egress_active: bool,
    pub session_uptime_seconds: i64,
    #[serde(default)]
    pub payload: serde_json::Value,
}
