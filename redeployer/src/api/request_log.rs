//! Access log middleware
//!
//! One line per request, whatever the method or outcome.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use super::AppState;
use crate::server::RemoteAddr;

pub async fn log_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let remote_address = request
        .extensions()
        .get::<ConnectInfo<RemoteAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    tracing::info!(
        parent: &state.span,
        http_request_method = %method,
        http_request_url = %uri,
        remote_address = %remote_address,
        status = response.status().as_u16(),
        request_duration = ?started.elapsed(),
        "served http request"
    );

    response
}
