use aegis_commons::context::{RequestContext, RequestId};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user, extracted from a bearer JWT's `uid` claim
/// (`spec.md` §6). Deliberately a single-secret HS256 decode, not a JWKS
/// client: auth is an out-of-scope thin adapter per `spec.md` §1, so this
/// stays as simple as the claim extraction it's asked to do.
pub struct AuthenticatedUser {
    pub user_id: String,
}

#[derive(Deserialize)]
struct Claims {
    uid: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(app_state.config.jwt_secret.as_bytes()),
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!(cause = %e, "bearer JWT rejected");
            ApiError::Unauthorized
        })?
        .claims;

        Ok(AuthenticatedUser {
            user_id: claims.uid,
        })
    }
}

/// Shared-key auth for the relay-facing heartbeat endpoint
/// (`X-Relay-Auth`, `spec.md` §6).
pub struct RelayAuth;

impl<S> FromRequestParts<S> for RelayAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let provided = parts
            .headers
            .get("X-Relay-Auth")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        if provided == app_state.config.relay_auth_secret {
            Ok(RelayAuth)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

/// Assembles the per-request `RequestContext` the `Coordinator` takes for
/// every operation, from the request-id middleware's `RequestId` extension
/// and the bearer-JWT-authenticated user. User identity isn't known until
/// auth runs, so this is built here rather than in the middleware.
impl<S> FromRequestParts<S> for RequestContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequestId(request_id) = parts
            .extensions
            .get::<RequestId>()
            .copied()
            .unwrap_or_else(|| RequestId(Uuid::new_v4()));

        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        Ok(RequestContext::new(request_id, user.user_id))
    }
}
