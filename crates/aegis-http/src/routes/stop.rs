use aegis_commons::context::RequestContext;
use aegis_commons::models::ids::SessionId;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::response::StopResponse;
use crate::state::{AppState, REQUEST_TIMEOUT};

#[derive(Deserialize)]
pub struct StopBody {
    session_id: String,
    #[allow(dead_code)]
    #[serde(default)]
    reason: Option<String>,
}

pub async fn stop_relay(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<StopBody>,
) -> Result<Json<StopResponse>, ApiError> {
    let session_id: SessionId = body
        .session_id
        .parse()
        .map_err(|e: aegis_commons::models::ids::IdParseError| ApiError::BadRequest(e.to_string()))?;

    let session = tokio::time::timeout(
        REQUEST_TIMEOUT,
        state.coordinator.stop_session(&ctx, &session_id),
    )
    .await
    .map_err(|_| ApiError::Core(aegis_commons::error::CoreError::Internal(
        "stop_session timed out".into(),
    )))??;

    Ok(Json(StopResponse::build(&session)))
}
