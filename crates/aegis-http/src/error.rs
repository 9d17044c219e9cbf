use aegis_commons::error::CoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Everything this surface can return as a non-success response, mapped to
/// the status/code table in `spec.md` §6. `CoreError` covers everything the
/// core can fail with; the two extra variants exist only at this layer,
/// which owns auth and the manifest's "nothing configured yet" case.
pub enum ApiError {
    Core(CoreError),
    Unauthorized,
    ManifestUnavailable,
    BadRequest(String),
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::Core(e)
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.code(),
            ApiError::Unauthorized => "unauthorized",
            ApiError::ManifestUnavailable => "manifest_unavailable",
            ApiError::BadRequest(_) => "invalid_request",
        }
    }

    fn status(&self) -> StatusCode {
        match self.code() {
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "invalid_request" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "idempotency_mismatch" => StatusCode::CONFLICT,
            "manifest_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Core(e) => e.to_string(),
            ApiError::Unauthorized => "missing or invalid credentials".to_string(),
            ApiError::ManifestUnavailable => "no relay manifest entries are configured".to_string(),
            ApiError::BadRequest(message) => message.clone(),
        };
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::Core(CoreError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn idempotency_mismatch_maps_to_409() {
        let err = ApiError::Core(CoreError::IdempotencyMismatch);
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn manifest_unavailable_maps_to_503() {
        assert_eq!(
            ApiError::ManifestUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn bad_request_maps_to_400_with_invalid_request_code() {
        let err = ApiError::BadRequest("missing header".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_request");
    }
}
