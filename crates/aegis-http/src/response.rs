use aegis_commons::models::relay_instance::RelayInstance;
use aegis_commons::models::session::{Session, SessionStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub region: String,
    pub relay: RelayBlock,
    pub credentials: CredentialsBlock,
    pub timers: TimersBlock,
}

#[derive(Serialize)]
pub struct RelayBlock {
    pub public_ip: Option<String>,
    pub srt_port: Option<i32>,
    pub ws_url: Option<String>,
}

#[derive(Serialize)]
pub struct CredentialsBlock {
    pub pair_token: Option<String>,
    pub relay_ws_token: Option<String>,
}

#[derive(Serialize)]
pub struct TimersBlock {
    pub grace_window_seconds: i64,
    pub max_session_seconds: i64,
}

impl SessionResponse {
    /// Assembles the wire shape from `spec.md` §6. A session with no bound
    /// relay (still `provisioning`, or a replay taken before activation)
    /// reports `relay`/`credentials` as nulls rather than placeholder values.
    pub fn build(session: &Session, relay: Option<&RelayInstance>) -> Self {
        let tokens_present = !session.pair_token.is_empty();

        Self {
            session_id: session.id.to_string(),
            status: session.status,
            region: session.region.clone(),
            relay: RelayBlock {
                public_ip: relay.map(|r| r.public_ip.clone()),
                srt_port: relay.map(|r| r.srt_port),
                ws_url: relay.map(|r| r.ws_url.clone()),
            },
            credentials: CredentialsBlock {
                pair_token: tokens_present.then(|| session.pair_token.clone()),
                relay_ws_token: tokens_present.then(|| session.relay_ws_token.clone()),
            },
            timers: TimersBlock {
                grace_window_seconds: session.grace_window_seconds,
                max_session_seconds: session.max_session_seconds,
            },
        }
    }
}

#[derive(Serialize)]
pub struct StopResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub stopped_at: DateTime<Utc>,
}

impl StopResponse {
    pub fn build(session: &Session) -> Self {
        Self {
            session_id: session.id.to_string(),
            status: session.status,
            stopped_at: session.stopped_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provisioning_session() -> Session {
        Session {
            id: "ses_1".parse().unwrap(),
            user_id: "usr_1".into(),
            status: SessionStatus::Provisioning,
            region: "us-east-1".into(),
            relay_instance_id: None,
            idempotency_key: uuid::Uuid::new_v4(),
            pair_token: String::new(),
            relay_ws_token: String::new(),
            started_at: Utc::now(),
            stopped_at: None,
            max_session_seconds: 57_600,
            grace_window_seconds: 600,
            duration_seconds: 0,
            reconciled_seconds: 0,
            requested_by: None,
        }
    }

    #[test]
    fn unbound_session_reports_null_relay_and_credentials() {
        let response = SessionResponse::build(&provisioning_session(), None);
        assert!(response.relay.public_ip.is_none());
        assert!(response.credentials.pair_token.is_none());
        assert!(response.credentials.relay_ws_token.is_none());
    }

    #[test]
    fn activated_session_reports_relay_and_credentials() {
        let mut session = provisioning_session();
        session.status = SessionStatus::Active;
        session.pair_token = "ABCDEFGH".into();
        session.relay_ws_token = "token".into();

        let relay = RelayInstance {
            id: "rly_1".parse().unwrap(),
            session_id: session.id.clone(),
            aws_instance_id: "i-1".into(),
            region: "us-east-1".into(),
            ami_id: "ami-1".into(),
            instance_type: "t3.small".into(),
            public_ip: "203.0.113.1".into(),
            srt_port: 9000,
            ws_url: "wss://relay.example/ws".into(),
            state: aegis_commons::models::relay_instance::RelayInstanceState::Running,
            launched_at: Utc::now(),
            terminated_at: None,
            last_health_at: None,
        };

        let response = SessionResponse::build(&session, Some(&relay));
        assert_eq!(response.relay.public_ip.as_deref(), Some("203.0.113.1"));
        assert_eq!(response.credentials.pair_token.as_deref(), Some("ABCDEFGH"));
    }

    #[test]
    fn stop_response_falls_back_to_now_when_stopped_at_missing() {
        let session = provisioning_session();
        let response = StopResponse::build(&session);
        assert_eq!(response.session_id, "ses_1");
    }
}
