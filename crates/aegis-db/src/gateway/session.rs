use aegis_commons::error::CoreError;
use aegis_commons::models::ids::SessionId;
use aegis_commons::models::session::{
    Session, DEFAULT_GRACE_WINDOW_SECONDS, DEFAULT_MAX_SESSION_SECONDS,
};
use aegis_commons::models::relay_instance::RelayInstance;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{Gateway, START_ENDPOINT};

/// Distinguishes a lost create race (step 3 of `start_or_get`) from every
/// other failure, so the retry-as-a-read only triggers on the one condition
/// it's meant for.
enum StartOrGetError {
    CreateRaceLost,
    Core(CoreError),
}

impl From<CoreError> for StartOrGetError {
    fn from(e: CoreError) -> Self {
        StartOrGetError::Core(e)
    }
}

impl From<serde_json::Error> for StartOrGetError {
    fn from(e: serde_json::Error) -> Self {
        StartOrGetError::Core(CoreError::from(e))
    }
}

pub struct StartOrGetInput {
    pub user_id: String,
    pub region: String,
    pub requested_by: Option<String>,
    pub key: Uuid,
    pub request_hash: String,
}

pub struct ActivateProvisionedInput {
    pub user_id: String,
    pub session_id: SessionId,
    pub region: String,
    pub aws_instance_id: String,
    pub ami_id: String,
    pub instance_type: String,
    pub public_ip: String,
    pub srt_port: i32,
    pub ws_url: String,
    pub pair_token: String,
    pub relay_ws_token: String,
}

const SESSION_COLUMNS: &str = "id, user_id, status, region, relay_instance_id, idempotency_key, \
     pair_token, relay_ws_token, started_at, stopped_at, max_session_seconds, \
     grace_window_seconds, duration_seconds, reconciled_seconds, requested_by";

impl Gateway {
    /// Implements `spec.md` §4.2 `StartOrGet`. Retries once, transparently,
    /// if a concurrent request wins the unique partial index race on step 3
    /// — the loser observes the winner's row via the same read path used
    /// for an already-live session (step 2).
    pub async fn start_or_get(
        &self,
        input: StartOrGetInput,
    ) -> Result<(Session, bool), CoreError> {
        match self.try_start_or_get(&input).await {
            Ok(result) => Ok(result),
            Err(StartOrGetError::CreateRaceLost) => {
                tracing::debug!(
                    user_id = %input.user_id,
                    "start_or_get lost the create race, retrying as a read"
                );
                match self.try_start_or_get(&input).await {
                    Ok(result) => Ok(result),
                    Err(StartOrGetError::CreateRaceLost) => Err(CoreError::Internal(
                        "start_or_get retry still lost the create race".into(),
                    )),
                    Err(StartOrGetError::Core(e)) => Err(e),
                }
            }
            Err(StartOrGetError::Core(e)) => Err(e),
        }
    }

    async fn try_start_or_get(
        &self,
        input: &StartOrGetInput,
    ) -> Result<(Session, bool), StartOrGetError> {
        let mut tx = self.pool.begin().await.map_err(log_db_err("start_or_get/begin"))?;

        let existing_record = sqlx::query(
            "SELECT request_hash, response_json FROM idempotency_records \
             WHERE user_id = $1 AND endpoint = $2 AND key = $3 AND expires_at > now()",
        )
        .bind(&input.user_id)
        .bind(START_ENDPOINT)
        .bind(input.key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(log_db_err("start_or_get/select idempotency"))?;

        if let Some(row) = existing_record {
            let stored_hash: String = row.get("request_hash");
            if stored_hash != input.request_hash {
                return Err(CoreError::IdempotencyMismatch.into());
            }
            let response_json: serde_json::Value = row.get("response_json");
            let session: Session = serde_json::from_value(response_json)?;
            tx.commit().await.map_err(log_db_err("start_or_get/commit replay"))?;
            return Ok((session, false));
        }

        let live_session = fetch_active_session(&mut tx, &input.user_id).await?;
        if let Some(session) = live_session {
            upsert_idempotency_record(&mut tx, &input.user_id, input.key, &input.request_hash, &session)
                .await?;
            tx.commit().await.map_err(log_db_err("start_or_get/commit existing"))?;
            return Ok((session, false));
        }

        let session_id = Session::new_id();
        let now = Utc::now();

        let insert_result = sqlx::query(
            "INSERT INTO sessions (id, user_id, status, region, idempotency_key, \
             pair_token, relay_ws_token, started_at, max_session_seconds, \
             grace_window_seconds, duration_seconds, reconciled_seconds, requested_by) \
             VALUES ($1, $2, 'provisioning', $3, $4, '', '', $5, $6, $7, 0, 0, $8)",
        )
        .bind(&session_id)
        .bind(&input.user_id)
        .bind(&input.region)
        .bind(input.key)
        .bind(now)
        .bind(DEFAULT_MAX_SESSION_SECONDS)
        .bind(DEFAULT_GRACE_WINDOW_SECONDS)
        .bind(&input.requested_by)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert_result {
            let is_unique_violation = e
                .as_database_error()
                .map(|de| de.is_unique_violation())
                .unwrap_or(false);
            if is_unique_violation {
                return Err(StartOrGetError::CreateRaceLost);
            }
            tracing::error!(cause = %e, "start_or_get/insert session failed");
            return Err(CoreError::Internal(e.to_string()).into());
        }

        let session = Session {
            id: session_id,
            user_id: input.user_id.clone(),
            status: aegis_commons::models::session::SessionStatus::Provisioning,
            region: input.region.clone(),
            relay_instance_id: None,
            idempotency_key: input.key,
            pair_token: String::new(),
            relay_ws_token: String::new(),
            started_at: now,
            stopped_at: None,
            max_session_seconds: DEFAULT_MAX_SESSION_SECONDS,
            grace_window_seconds: DEFAULT_GRACE_WINDOW_SECONDS,
            duration_seconds: 0,
            reconciled_seconds: 0,
            requested_by: input.requested_by.clone(),
        };

        upsert_idempotency_record(&mut tx, &input.user_id, input.key, &input.request_hash, &session)
            .await?;

        tx.commit().await.map_err(log_db_err("start_or_get/commit new"))?;
        Ok((session, true))
    }

    /// Implements `spec.md` §4.2 `ActivateProvisioned`. The `WHERE status = 'provisioning'`
    /// clause is the optimistic guard: if the session was concurrently stopped, zero
    /// rows are affected and the caller gets `NotFound`.
    pub async fn activate_provisioned(
        &self,
        input: ActivateProvisionedInput,
    ) -> Result<Session, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(log_db_err("activate_provisioned/begin"))?;

        let relay_id = RelayInstance::new_id();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO relay_instances (id, session_id, aws_instance_id, region, ami_id, \
             instance_type, public_ip, srt_port, ws_url, state, launched_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'running', $10)",
        )
        .bind(&relay_id)
        .bind(&input.session_id)
        .bind(&input.aws_instance_id)
        .bind(&input.region)
        .bind(&input.ami_id)
        .bind(&input.instance_type)
        .bind(&input.public_ip)
        .bind(input.srt_port)
        .bind(&input.ws_url)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(log_db_err("activate_provisioned/insert relay_instance"))?;

        let update_result = sqlx::query(
            "UPDATE sessions SET relay_instance_id = $1, status = 'active', pair_token = $2, \
             relay_ws_token = $3, updated_at = now() \
             WHERE id = $4 AND user_id = $5 AND status = 'provisioning'",
        )
        .bind(&relay_id)
        .bind(&input.pair_token)
        .bind(&input.relay_ws_token)
        .bind(&input.session_id)
        .bind(&input.user_id)
        .execute(&mut *tx)
        .await
        .map_err(log_db_err("activate_provisioned/update session"))?;

        if update_result.rows_affected() == 0 {
            tracing::warn!(
                session_id = %input.session_id,
                "activate_provisioned found no provisioning session to activate"
            );
            return Err(CoreError::NotFound);
        }

        let session = fetch_session_by_id(&mut tx, &input.user_id, &input.session_id).await?;
        tx.commit()
            .await
            .map_err(log_db_err("activate_provisioned/commit"))?;
        Ok(session)
    }

    /// Implements `spec.md` §4.2 `StopSession`: idempotent at this layer —
    /// calling stop on an already-stopped session is a no-op that returns
    /// the existing row.
    pub async fn stop_session(&self, user_id: &str, session_id: &SessionId) -> Result<Session, CoreError> {
        let mut tx = self.pool.begin().await.map_err(log_db_err("stop_session/begin"))?;

        let session = fetch_session_by_id(&mut tx, user_id, session_id).await?;

        if !matches!(session.status, aegis_commons::models::session::SessionStatus::Stopped) {
            sqlx::query(
                "UPDATE sessions SET status = 'stopped', stopped_at = now(), updated_at = now() \
                 WHERE id = $1 AND status IN ('provisioning', 'active', 'grace')",
            )
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(log_db_err("stop_session/update session"))?;

            if let Some(relay_instance_id) = &session.relay_instance_id {
                sqlx::query(
                    "UPDATE relay_instances SET state = 'terminated', \
                     terminated_at = COALESCE(terminated_at, now()) WHERE id = $1",
                )
                .bind(relay_instance_id)
                .execute(&mut *tx)
                .await
                .map_err(log_db_err("stop_session/update relay_instance"))?;
            }
        }

        let session = fetch_session_by_id(&mut tx, user_id, session_id).await?;
        tx.commit().await.map_err(log_db_err("stop_session/commit"))?;
        Ok(session)
    }

    pub async fn get_session_by_id(&self, user_id: &str, session_id: &SessionId) -> Result<Session, CoreError> {
        sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1 AND user_id = $2"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_err("get_session_by_id"))?
        .ok_or(CoreError::NotFound)
    }

    pub async fn get_active_session(&self, user_id: &str) -> Result<Option<Session>, CoreError> {
        sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE user_id = $1 AND status IN ('provisioning', 'active', 'grace') \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_err("get_active_session"))
    }
}

async fn fetch_active_session(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
) -> Result<Option<Session>, CoreError> {
    sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions \
         WHERE user_id = $1 AND status IN ('provisioning', 'active', 'grace') \
         ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(log_db_err("fetch_active_session"))
}

async fn fetch_session_by_id(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
    session_id: &SessionId,
) -> Result<Session, CoreError> {
    sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1 AND user_id = $2"
    ))
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(log_db_err("fetch_session_by_id"))?
    .ok_or(CoreError::NotFound)
}

async fn upsert_idempotency_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: &str,
    key: Uuid,
    request_hash: &str,
    session: &Session,
) -> Result<(), CoreError> {
    let response_json = serde_json::to_value(session)?;
    let expires_at = Utc::now()
        + chrono::Duration::seconds(aegis_commons::models::idempotency::IDEMPOTENCY_TTL_SECONDS);

    sqlx::query(
        "INSERT INTO idempotency_records (user_id, endpoint, key, request_hash, response_json, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id, endpoint, key) DO UPDATE SET \
         response_json = EXCLUDED.response_json, expires_at = EXCLUDED.expires_at",
    )
    .bind(user_id)
    .bind(START_ENDPOINT)
    .bind(key)
    .bind(request_hash)
    .bind(response_json)
    .bind(expires_at)
    .execute(&mut **tx)
    .await
    .map_err(log_db_err("upsert_idempotency_record"))?;

    Ok(())
}

fn log_db_err(context: &'static str) -> impl Fn(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(cause = %e, context, "database operation failed");
        CoreError::Internal(e.to_string())
    }
}
