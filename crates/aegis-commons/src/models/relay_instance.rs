use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{RelayInstanceId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RelayInstanceState {
    Provisioning,
    Running,
    Terminating,
    Terminated,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RelayInstance {
    pub id: RelayInstanceId,
    pub session_id: SessionId,
    pub aws_instance_id: String,
    pub region: String,
    pub ami_id: String,
    pub instance_type: String,
    pub public_ip: String,
    pub srt_port: i32,
    pub ws_url: String,
    pub state: RelayInstanceState,
    pub launched_at: DateTime<Utc>,
    pub terminated_at: Option<DateTime<Utc>>,
    pub last_health_at: Option<DateTime<Utc>>,
}

impl RelayInstance {
    pub fn new_id() -> RelayInstanceId {
        RelayInstanceId::generate()
    }
}
