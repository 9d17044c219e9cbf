//! Exercises both branches of `record_relay_health` admission (`spec.md`
//! §4.4 / §8): a health event is accepted iff the session's
//! `relay_instance_id` is non-null at insertion time. Ignored by default
//! since there is no database in a plain `cargo test` run; point
//! `AEGIS_TEST_DATABASE_URL` at a scratch Postgres loaded from
//! `crates/aegis-db/schema.sql` to exercise them, matching the convention in
//! `aegis-coordinator/tests/saga_e2e.rs`.

use aegis_commons::error::CoreError;
use aegis_commons::models::health::RelayHealthInput;
use aegis_db::gateway::{ActivateProvisionedInput, StartOrGetInput};
use aegis_db::Gateway;
use uuid::Uuid;

async fn gateway() -> Gateway {
    let url = std::env::var("AEGIS_TEST_DATABASE_URL")
        .expect("set AEGIS_TEST_DATABASE_URL to run health_admission tests");
    let pool = aegis_db::init_pool(&url, 5)
        .await
        .expect("connect to test database");
    Gateway::new(pool)
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn health_event_accepted_once_a_relay_instance_is_bound() {
    let gateway = gateway().await;

    let (session, created) = gateway
        .start_or_get(StartOrGetInput {
            user_id: "usr_health_accept".into(),
            region: "us-east-1".into(),
            requested_by: None,
            key: Uuid::new_v4(),
            request_hash: "hash-health-accept".into(),
        })
        .await
        .unwrap();
    assert!(created);

    let activated = gateway
        .activate_provisioned(ActivateProvisionedInput {
            user_id: "usr_health_accept".into(),
            session_id: session.id.clone(),
            region: "us-east-1".into(),
            aws_instance_id: "i-health-accept".into(),
            ami_id: "ami-0123".into(),
            instance_type: "t3.small".into(),
            public_ip: "203.0.113.20".into(),
            srt_port: 9000,
            ws_url: "wss://relay.example/ws".into(),
            pair_token: "PAIRTOKEN".into(),
            relay_ws_token: "wstoken".into(),
        })
        .await
        .unwrap();
    assert!(activated.relay_instance_id.is_some());

    aegis_health::record_relay_health(
        &gateway,
        RelayHealthInput {
            session_id: session.id.to_string(),
            observed_at: None,
            ingest_active: true,
            egress_active: true,
            session_uptime_seconds: 42,
            payload: serde_json::json!({}),
        },
    )
    .await
    .unwrap();

    let relay = gateway
        .get_relay_instance_by_session(&session.id)
        .await
        .unwrap()
        .expect("relay instance bound during activation");
    assert!(relay.last_health_at.is_some());
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn health_event_rejected_when_no_relay_is_bound() {
    let gateway = gateway().await;

    let (session, created) = gateway
        .start_or_get(StartOrGetInput {
            user_id: "usr_health_reject".into(),
            region: "us-east-1".into(),
            requested_by: None,
            key: Uuid::new_v4(),
            request_hash: "hash-health-reject".into(),
        })
        .await
        .unwrap();
    assert!(created);
    assert!(session.relay_instance_id.is_none());

    let result = aegis_health::record_relay_health(
        &gateway,
        RelayHealthInput {
            session_id: session.id.to_string(),
            observed_at: None,
            ingest_active: true,
            egress_active: true,
            session_uptime_seconds: 0,
            payload: serde_json::json!({}),
        },
    )
    .await;

    assert!(matches!(result, Err(CoreError::RelayHealthRejected)));
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn health_event_rejected_for_unknown_session() {
    let gateway = gateway().await;

    let result = aegis_health::record_relay_health(
        &gateway,
        RelayHealthInput {
            session_id: "ses_does-not-exist".into(),
            observed_at: None,
            ingest_active: true,
            egress_active: true,
            session_uptime_seconds: 0,
            payload: serde_json::json!({}),
        },
    )
    .await;

    assert!(matches!(result, Err(CoreError::RelayHealthRejected)));
}
