use aegis_commons::context::RequestContext;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ApiError;
use crate::response::SessionResponse;
use crate::state::AppState;

pub async fn get_active(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let session = state.coordinator.get_active(&ctx).await?;

    let Some(session) = session else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let relay = state.gateway.get_relay_instance_by_session(&session.id).await?;
    let response = SessionResponse::build(&session, relay.as_ref());
    Ok((StatusCode::OK, Json(response)).into_response())
}
