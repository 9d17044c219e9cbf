use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{RelayInstanceId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Provisioning,
    Active,
    Grace,
    Stopped,
}

impl SessionStatus {
    /// Statuses that count toward the "at most one live session per user" invariant.
    pub const LIVE: [SessionStatus; 3] = [
        SessionStatus::Provisioning,
        SessionStatus::Active,
        SessionStatus::Grace,
    ];

    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionStatus::Provisioning | SessionStatus::Active | SessionStatus::Grace
        )
    }
}

pub const DEFAULT_MAX_SESSION_SECONDS: i64 = 57_600;
pub const DEFAULT_GRACE_WINDOW_SECONDS: i64 = 600;
pub const DEFAULT_SRT_PORT: i32 = 9000;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: SessionId,
    pub user_id: String,
    pub status: SessionStatus,
    pub region: String,
    pub relay_instance_id: Option<RelayInstanceId>,
    pub idempotency_key: Uuid,
    pub pair_token: String,
    pub relay_ws_token: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub max_session_seconds: i64,
    pub grace_window_seconds: i64,
    pub duration_seconds: i64,
    pub reconciled_seconds: i64,
    pub requested_by: Option<String>,
}

impl Session {
    pub fn new_id() -> SessionId {
        SessionId::generate()
    }
}
