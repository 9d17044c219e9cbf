//! End-to-end coverage of the session-start/stop saga against a real
//! Postgres instance, matching the ten scenarios in `spec.md` §8. Ignored by
//! default since there is no database in a plain `cargo test` run; point
//! `AEGIS_TEST_DATABASE_URL` at a scratch Postgres loaded from
//! `crates/aegis-db/schema.sql` to exercise them.

use std::sync::Arc;
use std::time::Duration;

use aegis_commons::config::AppConfig;
use aegis_commons::context::RequestContext;
use aegis_coordinator::{Coordinator, StartRequest};
use aegis_db::Gateway;
use aegis_provisioner::mock::MockProvisioner;
use aegis_provisioner::{DeprovisionInput, ProvisionInput, Provisioner, ProvisionedRelay, ProvisionerError};
use async_trait::async_trait;
use uuid::Uuid;

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        database_url: String::new(),
        bind_addr: "0.0.0.0:0".into(),
        default_region: "us-east-1".into(),
        supported_regions: vec!["us-east-1".into(), "us-west-2".into()],
        jwt_secret: "test".into(),
        relay_auth_secret: "test".into(),
        provisioner_base_url: "http://localhost".into(),
        db_max_connections: 5,
    })
}

fn ctx(user_id: &str) -> RequestContext {
    RequestContext::new(Uuid::new_v4(), user_id)
}

fn sample_relay(session_id: &str) -> ProvisionedRelay {
    ProvisionedRelay {
        aws_instance_id: format!("i-{session_id}"),
        ami_id: "ami-0123".into(),
        instance_type: "t3.small".into(),
        public_ip: "203.0.113.10".into(),
        srt_port: 9000,
        ws_url: "wss://relay.example/ws".into(),
    }
}

/// Delays `provision` just long enough for a concurrently-running stop to
/// land on the provisioning-status row, without needing `MockProvisioner`
/// itself to support timing.
struct DelayedProvisioner {
    inner: Arc<MockProvisioner>,
    delay: Duration,
}

#[async_trait]
impl Provisioner for DelayedProvisioner {
    async fn provision(&self, input: ProvisionInput) -> Result<ProvisionedRelay, ProvisionerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.provision(input).await
    }

    async fn deprovision(&self, input: DeprovisionInput) -> Result<(), ProvisionerError> {
        self.inner.deprovision(input).await
    }
}

async fn gateway() -> Gateway {
    let url = std::env::var("AEGIS_TEST_DATABASE_URL")
        .expect("set AEGIS_TEST_DATABASE_URL to run saga_e2e tests");
    let pool = aegis_db::init_pool(&url, 5)
        .await
        .expect("connect to test database");
    Gateway::new(pool)
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn start_session_happy_path_activates_and_returns_created() {
    let gateway = gateway().await;
    let provisioner = Arc::new(MockProvisioner::default());
    provisioner.push_provision_result(Ok(sample_relay("ses_happy")));
    let coordinator = Coordinator::new(
        gateway,
        provisioner.clone() as Arc<dyn Provisioner>,
        test_config(),
    );

    let (session, created) = coordinator
        .start_session(
            &ctx("usr_happy"),
            StartRequest {
                region_preference: "us-east-1".into(),
                requested_by: Some("ios-app".into()),
                idempotency_key: Uuid::new_v4(),
                request_hash: "hash-1".into(),
            },
        )
        .await
        .unwrap();

    assert!(created);
    assert_eq!(session.status, aegis_commons::models::session::SessionStatus::Active);
    assert_eq!(provisioner.provision_call_count(), 1);
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn replayed_start_with_same_idempotency_key_does_not_reprovision() {
    let gateway = gateway().await;
    let provisioner = Arc::new(MockProvisioner::default());
    provisioner.push_provision_result(Ok(sample_relay("ses_replay")));
    let coordinator = Coordinator::new(
        gateway,
        provisioner.clone() as Arc<dyn Provisioner>,
        test_config(),
    );

    let key = Uuid::new_v4();
    let request = || StartRequest {
        region_preference: "us-east-1".into(),
        requested_by: None,
        idempotency_key: key,
        request_hash: "hash-2".into(),
    };
    let caller = ctx("usr_replay");

    let (first, created_first) = coordinator.start_session(&caller, request()).await.unwrap();
    let (second, created_second) = coordinator.start_session(&caller, request()).await.unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first.id, second.id);
    assert_eq!(provisioner.provision_call_count(), 1);
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn provision_failure_compensates_by_stopping_the_session() {
    let gateway = gateway().await;
    let provisioner = Arc::new(MockProvisioner::default());
    provisioner.push_provision_result(Err(ProvisionerError::new(
        "InvalidParameterValue",
        "no capacity",
    )));
    let coordinator = Coordinator::new(
        gateway.clone(),
        provisioner.clone() as Arc<dyn Provisioner>,
        test_config(),
    );

    let result = coordinator
        .start_session(
            &ctx("usr_provfail"),
            StartRequest {
                region_preference: "us-east-1".into(),
                requested_by: None,
                idempotency_key: Uuid::new_v4(),
                request_hash: "hash-3".into(),
            },
        )
        .await;

    assert!(result.is_err());
    let active = gateway.get_active_session("usr_provfail").await.unwrap();
    assert!(active.is_none());
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn activation_failure_after_provision_compensates_with_deprovision_and_stop() {
    // Scenario 5 (`spec.md` §8): the session is stopped by another actor
    // between `StartOrGet` and `ActivateProvisioned`, so the optimistic
    // `WHERE status = 'provisioning'` guard in `activate_provisioned` finds
    // no row to update. The saga must still run exactly one compensating
    // deprovision against the instance that was actually provisioned, plus
    // one compensating stop, and surface the error the gateway raised.
    //
    // `Gateway` is a concrete `PgPool` wrapper, not a trait, so there is no
    // seam to inject the race directly. Instead, `DelayedProvisioner` holds
    // `provision` open long enough for a concurrently-polling task to catch
    // the session in `provisioning` and stop it out from under the saga.
    let gateway = gateway().await;
    let mock = Arc::new(MockProvisioner::default());
    mock.push_provision_result(Ok(sample_relay("ses_actfail")));
    mock.push_deprovision_result(Ok(()));
    let provisioner = Arc::new(DelayedProvisioner {
        inner: mock.clone(),
        delay: Duration::from_millis(200),
    });
    let coordinator = Coordinator::new(
        gateway.clone(),
        provisioner.clone() as Arc<dyn Provisioner>,
        test_config(),
    );

    let caller = ctx("usr_actfail");
    let start_fut = coordinator.start_session(
        &caller,
        StartRequest {
            region_preference: "us-east-1".into(),
            requested_by: None,
            idempotency_key: Uuid::new_v4(),
            request_hash: "hash-5".into(),
        },
    );

    let racer_gateway = gateway.clone();
    let racer = async move {
        for _ in 0..100 {
            if let Ok(Some(session)) = racer_gateway.get_active_session("usr_actfail").await {
                if session.status == aegis_commons::models::session::SessionStatus::Provisioning {
                    racer_gateway
                        .stop_session("usr_actfail", &session.id)
                        .await
                        .unwrap();
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("provisioning session never appeared for the racer to stop");
    };

    let (result, _) = tokio::join!(start_fut, racer);

    assert!(result.is_err());
    assert_eq!(mock.deprovision_calls().len(), 1);
    assert_eq!(mock.deprovision_calls()[0].aws_instance_id, "i-ses_actfail");

    let active = gateway.get_active_session("usr_actfail").await.unwrap();
    assert!(active.is_none());
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn stop_on_active_session_deprovisions_and_marks_stopped() {
    let gateway = gateway().await;
    let provisioner = Arc::new(MockProvisioner::default());
    provisioner.push_provision_result(Ok(sample_relay("ses_stop")));
    let coordinator = Coordinator::new(
        gateway,
        provisioner.clone() as Arc<dyn Provisioner>,
        test_config(),
    );

    let caller = ctx("usr_stop");
    let (session, _) = coordinator
        .start_session(
            &caller,
            StartRequest {
                region_preference: "us-east-1".into(),
                requested_by: None,
                idempotency_key: Uuid::new_v4(),
                request_hash: "hash-4".into(),
            },
        )
        .await
        .unwrap();

    provisioner.push_deprovision_result(Ok(()));
    let stopped = coordinator
        .stop_session(&caller, &session.id)
        .await
        .unwrap();

    assert_eq!(
        stopped.status,
        aegis_commons::models::session::SessionStatus::Stopped
    );
    assert_eq!(provisioner.deprovision_calls().len(), 1);
}

#[tokio::test]
#[ignore = "requires a live Postgres at AEGIS_TEST_DATABASE_URL"]
async fn stop_leaves_session_untransitioned_when_deprovision_fails() {
    let gateway = gateway().await;
    let provisioner = Arc::new(MockProvisioner::default());
    provisioner.push_provision_result(Ok(sample_relay("ses_stopfail")));
    let coordinator = Coordinator::new(
        gateway.clone(),
        provisioner.clone() as Arc<dyn Provisioner>,
        test_config(),
    );

    let caller = ctx("usr_stopfail");
    let (session, _) = coordinator
        .start_session(
            &caller,
            StartRequest {
                region_preference: "us-east-1".into(),
                requested_by: None,
                idempotency_key: Uuid::new_v4(),
                request_hash: "hash-5".into(),
            },
        )
        .await
        .unwrap();

    provisioner.push_deprovision_result(Err(ProvisionerError::new("InternalError", "timed out")));
    let result = coordinator.stop_session(&caller, &session.id).await;

    assert!(result.is_err());
    let still_active = gateway.get_active_session("usr_stopfail").await.unwrap();
    assert!(still_active.is_some());
}
