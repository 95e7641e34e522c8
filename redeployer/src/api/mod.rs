//! API Module
//!
//! HTTP surface of the listener: a health check and the webhook receiver,
//! both on `/`.

pub mod health;
pub mod notification;
pub mod request_log;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::queue::NotificationSender;

/// Shared state of the listener
#[derive(Debug, Clone)]
pub struct AppState {
    /// Hand-off to the updater
    pub queue: NotificationSender,
    /// Parent span for everything the listener logs
    pub span: Span,
}

impl AppState {
    pub fn new(queue: NotificationSender, span: Span) -> Self {
        Self { queue, span }
    }
}

/// Create the listener router
///
/// Methods other than GET and POST on `/` get 405 from the method router.
/// Webhook bodies are read without a size limit.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(health::health_check).post(notification::receive_notification),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_log::log_request,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
