use axum::http::header;
use axum::response::{IntoResponse, Response};

pub async fn render_metrics() -> Response {
    let body = aegis_metrics::global().render();
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response()
}
