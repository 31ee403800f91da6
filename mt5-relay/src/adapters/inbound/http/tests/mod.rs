//! Test utilities for the HTTP adapter


use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};

use super::{create_router, HttpState};
use crate::application::{Dispatcher, Session};
use crate::ports::{MockHousekeeping, MockTerminal};

pub(crate) fn create_test_router(terminal: MockTerminal) -> Router {
    let session = Arc::new(Session::new(
        Arc::new(terminal),
        Arc::new(MockHousekeeping::new()),
        Duration::ZERO,
    ));
    let dispatcher = Arc::new(Dispatcher::new(session, "terminal64.exe"));
    create_router(HttpState { dispatcher })
}

pub(crate) fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
