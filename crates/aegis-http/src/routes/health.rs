use aegis_commons::models::health::RelayHealthInput;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::RelayAuth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OkResponse {
    ok: bool,
}

pub async fn post_relay_health(
    State(state): State<AppState>,
    _relay: RelayAuth,
    Json(input): Json<RelayHealthInput>,
) -> Result<Json<OkResponse>, ApiError> {
    aegis_health::record_relay_health(&state.gateway, input).await?;
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Serialize)]
pub struct HealthzResponse {
    status: &'static str,
}

pub async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse { status: "ok" })
}
