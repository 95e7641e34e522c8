//! Webhook API Handler
//!
//! Accepts build notifications and queues them for the updater. The caller
//! always gets 200: body read errors, decode problems and downstream
//! failures only show up in the logs.

use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{
        StatusCode,
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use redeployer_core::domain::notification::{BuildNotification, Decoded};

use super::AppState;
use crate::queue::QueuedNotification;

/// POST /
/// Decode a build notification and enqueue it
///
/// Fields that are null or of the wrong type keep their defaults; the rest of
/// the payload is still used. A body that cannot be read or is not JSON
/// becomes an empty notification, which the updater skips. Waits while the
/// queue is full.
pub async fn receive_notification(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let decoded = match body {
        Ok(body) => BuildNotification::decode_lenient(&body),
        Err(e) => {
            tracing::error!(parent: &state.span, error = %e, "failed to read notification body");
            Decoded::default()
        }
    };

    for problem in &decoded.problems {
        tracing::error!(
            parent: &state.span,
            field = %problem.field,
            error = %problem.message,
            "failed to decode notification"
        );
    }

    let queued = QueuedNotification::new(decoded.notification);
    tracing::info!(
        parent: &state.span,
        delivery_id = %queued.delivery_id,
        repository = %queued.notification.repository,
        docker_url = %queued.notification.docker_url,
        build_id = %queued.notification.build_id,
        "notification received"
    );

    if let Err(e) = state.queue.enqueue(queued).await {
        tracing::error!(
            parent: &state.span,
            delivery_id = %e.0.delivery_id,
            "updater is not running, notification dropped"
        );
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json"), (ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
    )
}
