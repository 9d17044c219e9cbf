use std::time::Instant;

use aegis_commons::context::RequestContext;
use aegis_commons::error::CoreError;
use aegis_commons::models::ids::SessionId;
use aegis_commons::models::session::Session;
use aegis_db::gateway::{ActivateProvisionedInput, StartOrGetInput};
use aegis_provisioner::{DeprovisionInput, ProvisionInput};
use uuid::Uuid;

use crate::token::{generate_pair_token, generate_relay_ws_token};
use crate::Coordinator;

pub struct StartRequest {
    pub region_preference: String,
    pub requested_by: Option<String>,
    pub idempotency_key: Uuid,
    pub request_hash: String,
}

impl Coordinator {
    /// Implements `spec.md` §4.1 `StartSession`. The `bool` in the returned
    /// tuple is `created`: `false` means "replay or existing live session",
    /// which the HTTP layer turns into a 200; `true` means a fresh session
    /// was activated, turned into a 201.
    pub async fn start_session(
        &self,
        ctx: &RequestContext,
        request: StartRequest,
    ) -> Result<(Session, bool), CoreError> {
        let region = self.config.region_or_default(&request.region_preference);

        let (session, created) = self
            .gateway
            .start_or_get(StartOrGetInput {
                user_id: ctx.user_id.clone(),
                region: region.clone(),
                requested_by: request.requested_by.clone(),
                key: request.idempotency_key,
                request_hash: request.request_hash,
            })
            .await?;

        if !created {
            return Ok((session, false));
        }

        let provision_started = Instant::now();
        let provisioned = self
            .provisioner
            .provision(ProvisionInput {
                session_id: session.id.to_string(),
                user_id: ctx.user_id.clone(),
                region: region.clone(),
            })
            .await;
        aegis_metrics::global().observe_histogram(
            "aegis_relay_provision_latency_ms",
            &[],
            provision_started.elapsed().as_millis() as f64,
        );

        let provisioned = match provisioned {
            Ok(provisioned) => provisioned,
            Err(error) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    session_id = %session.id,
                    code = %error.code,
                    "provision failed, compensating by stopping the session"
                );
                self.best_effort_stop(&ctx.user_id, &session.id).await;
                return Err(CoreError::Internal(format!(
                    "provision failed: {}",
                    error.message
                )));
            }
        };

        let pair_token = generate_pair_token();
        let relay_ws_token = generate_relay_ws_token();
        let (pair_token, relay_ws_token) = match (pair_token, relay_ws_token) {
            (Ok(pair), Ok(ws)) => (pair, ws),
            _ => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    session_id = %session.id,
                    "token RNG failed, compensating by deprovisioning and stopping the session"
                );
                self.best_effort_deprovision(
                    &ctx.user_id,
                    &session.id,
                    &region,
                    &provisioned.aws_instance_id,
                )
                .await;
                self.best_effort_stop(&ctx.user_id, &session.id).await;
                return Err(CoreError::Internal("token generation failed".into()));
            }
        };

        let activated = self
            .gateway
            .activate_provisioned(ActivateProvisionedInput {
                user_id: ctx.user_id.clone(),
                session_id: session.id.clone(),
                region,
                aws_instance_id: provisioned.aws_instance_id.clone(),
                ami_id: provisioned.ami_id,
                instance_type: provisioned.instance_type,
                public_ip: provisioned.public_ip,
                srt_port: provisioned.srt_port,
                ws_url: provisioned.ws_url,
                pair_token,
                relay_ws_token,
            })
            .await;

        match activated {
            Ok(session) => Ok((session, true)),
            Err(error) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    session_id = %session.id,
                    cause = %error,
                    "activation failed after successful provision, compensating"
                );
                self.best_effort_deprovision(
                    &ctx.user_id,
                    &session.id,
                    &session.region,
                    &provisioned.aws_instance_id,
                )
                .await;
                self.best_effort_stop(&ctx.user_id, &session.id).await;
                Err(error)
            }
        }
    }

    async fn best_effort_stop(&self, user_id: &str, session_id: &SessionId) {
        if let Err(e) = self.gateway.stop_session(user_id, session_id).await {
            tracing::error!(
                session_id = %session_id,
                cause = %e,
                "compensating stop_session failed"
            );
        }
    }

    async fn best_effort_deprovision(
        &self,
        user_id: &str,
        session_id: &SessionId,
        region: &str,
        aws_instance_id: &str,
    ) {
        let started = Instant::now();
        let result = self
            .provisioner
            .deprovision(DeprovisionInput {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
                region: region.to_string(),
                aws_instance_id: aws_instance_id.to_string(),
            })
            .await;
        aegis_metrics::global().observe_histogram(
            "aegis_relay_deprovision_latency_ms",
            &[],
            started.elapsed().as_millis() as f64,
        );
        if let Err(e) = result {
            tracing::error!(
                session_id = %session_id,
                aws_instance_id,
                code = %e.code,
                "compensating deprovision failed"
            );
        }
    }
}
