use aegis_commons::context::RequestContext;
use aegis_coordinator::StartRequest;
use aegis_db::hash::canonical_request_hash;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::response::SessionResponse;
use crate::state::{AppState, REQUEST_TIMEOUT};

#[derive(Deserialize, Default)]
struct ClientContext {
    requested_by: Option<String>,
}

#[derive(Deserialize, Default)]
struct StartBody {
    #[serde(default)]
    region_preference: String,
    #[serde(default)]
    client_context: ClientContext,
}

pub async fn start_relay(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Json(raw_body): Json<Value>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| ApiError::BadRequest("missing or invalid Idempotency-Key header".into()))?;

    let request_hash = canonical_request_hash(&raw_body);
    let body: StartBody = serde_json::from_value(raw_body).unwrap_or_default();

    let (session, created) = tokio::time::timeout(
        REQUEST_TIMEOUT,
        state.coordinator.start_session(
            &ctx,
            StartRequest {
                region_preference: body.region_preference,
                requested_by: body.client_context.requested_by,
                idempotency_key,
                request_hash,
            },
        ),
    )
    .await
    .map_err(|_| ApiError::Core(aegis_commons::error::CoreError::Internal(
        "start_session timed out".into(),
    )))??;

    let relay = state.gateway.get_relay_instance_by_session(&session.id).await?;
    let response = SessionResponse::build(&session, relay.as_ref());
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };

    Ok((status, Json(response)))
}
