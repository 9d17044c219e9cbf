use aegis_commons::models::usage::UsageCurrent;
use axum::extract::State;
use axum::Json;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_usage_current(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UsageCurrent>, ApiError> {
    let usage = state.gateway.get_usage_current(&user.user_id).await?;
    Ok(Json(usage))
}
