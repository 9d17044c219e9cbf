use aegis_commons::error::CoreError;
use aegis_commons::models::ids::SessionId;
use aegis_commons::models::relay_instance::RelayInstance;

use super::Gateway;

const RELAY_INSTANCE_COLUMNS: &str = "id, session_id, aws_instance_id, region, ami_id, \
     instance_type, public_ip, srt_port, ws_url, state, launched_at, terminated_at, last_health_at";

impl Gateway {
    /// Looks up the relay instance bound to a session. The coordinator needs
    /// this to recover the `aws_instance_id` the external provisioner
    /// expects on `Deprovision`, since `Session.relay_instance_id` is this
    /// system's own primary key, not the cloud provider's.
    pub async fn get_relay_instance_by_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<RelayInstance>, CoreError> {
        sqlx::query_as::<_, RelayInstance>(&format!(
            "SELECT {RELAY_INSTANCE_COLUMNS} FROM relay_instances WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_err("get_relay_instance_by_session"))
    }
}

fn log_db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(cause = %e, context, "database operation failed");
        CoreError::Internal(e.to_string())
    }
}
