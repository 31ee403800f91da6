//! Request/response transport
//!
//! `POST /<operation>` with a JSON object body, answered with the
//! dispatcher's result. Time-series operations answer with a `.npy` array.
//! `GET /health` answers without touching the terminal.

mod error;
mod handlers;

#[cfg(test)]
mod tests;

pub use error::ProblemDetails;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use crate::application::Dispatcher;

#[derive(Clone)]
pub struct HttpState {
    pub dispatcher: Arc<Dispatcher>,
}

pub fn create_router(state: HttpState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            tracing::debug!(
                method = %request.method(),
                uri = %request.uri(),
                "HTTP request started"
            );
        })
        .on_response(
            DefaultOnResponse::new()
                .level(tracing::Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/:operation", post(handlers::dispatch_operation))
        .layer(trace_layer)
        .with_state(state)
}
