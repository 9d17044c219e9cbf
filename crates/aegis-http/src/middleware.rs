use aegis_commons::context::RequestId;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stamps every request with a request id (reusing one the caller sent, if
/// any) and carries it through request extensions as a per-request value
/// rather than a module global (`spec.md` §9's "dynamic request-scoped
/// values" note), then echoes it back on the response for correlation.
///
/// Only the id is known here, ahead of authentication; handlers combine this
/// with the authenticated user id into a full `RequestContext` via the
/// `RequestContext` extractor in `auth.rs`.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let parsed = Uuid::parse_str(&request_id).unwrap_or_else(|_| Uuid::new_v4());
    request.extensions_mut().insert(RequestId(parsed));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
