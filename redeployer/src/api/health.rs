//! Health Check API Handler

use axum::http::StatusCode;

/// GET /
/// Always 200 with an empty body
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
