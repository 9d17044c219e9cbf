use aegis_commons::models::manifest::RelayManifestEntry;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ManifestResponse {
    regions: Vec<RelayManifestEntry>,
}

pub async fn get_manifest(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<ManifestResponse>, ApiError> {
    let regions = state.gateway.get_manifest().await?;

    if regions.is_empty() {
        return Err(ApiError::ManifestUnavailable);
    }

    Ok(Json(ManifestResponse { regions }))
}
