use std::time::Instant;

use aegis_commons::context::RequestContext;
use aegis_commons::error::CoreError;
use aegis_commons::models::ids::SessionId;
use aegis_commons::models::session::{Session, SessionStatus};
use aegis_provisioner::DeprovisionInput;

use crate::Coordinator;

impl Coordinator {
    /// Implements `spec.md` §4.1 `StopSession`. Deprovisioning happens in its
    /// own call, outside any database transaction, deliberately: if it fails
    /// the session must not be marked stopped, or a client retry would never
    /// see the VM torn down (`spec.md` §7).
    pub async fn stop_session(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
    ) -> Result<Session, CoreError> {
        let session = self.gateway.get_session_by_id(&ctx.user_id, session_id).await?;

        if session.status != SessionStatus::Stopped && session.relay_instance_id.is_some() {
            let relay_instance = self
                .gateway
                .get_relay_instance_by_session(&session.id)
                .await?;

            if let Some(relay_instance) = relay_instance {
                let started = Instant::now();
                let result = self
                    .provisioner
                    .deprovision(DeprovisionInput {
                        session_id: session.id.to_string(),
                        user_id: ctx.user_id.clone(),
                        region: session.region.clone(),
                        aws_instance_id: relay_instance.aws_instance_id,
                    })
                    .await;
                aegis_metrics::global().observe_histogram(
                    "aegis_relay_deprovision_latency_ms",
                    &[],
                    started.elapsed().as_millis() as f64,
                );

                if let Err(error) = result {
                    tracing::error!(
                        request_id = %ctx.request_id,
                        session_id = %session.id,
                        code = %error.code,
                        "deprovision failed during stop, leaving session untransitioned"
                    );
                    return Err(CoreError::Internal(format!(
                        "deprovision failed: {}",
                        error.message
                    )));
                }
            }
        }

        self.gateway.stop_session(&ctx.user_id, session_id).await
    }

    /// Implements `spec.md` §4.1 `GetActive`.
    pub async fn get_active(&self, ctx: &RequestContext) -> Result<Option<Session>, CoreError> {
        self.gateway.get_active_session(&ctx.user_id).await
    }
}
