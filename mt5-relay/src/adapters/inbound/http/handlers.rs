use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use super::{HttpState, ProblemDetails};
use crate::application::{Operation, Reply};

/// Liveness probe. Never touches the terminal.
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// POST /:operation
pub async fn dispatch_operation(
    State(state): State<HttpState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Response, ProblemDetails> {
    let instance = format!("/{}", name);
    let op: Operation = name
        .parse()
        .map_err(|e| ProblemDetails::from(e).with_instance(instance.clone()))?;
    let args = parse_body(&body).map_err(|p| p.with_instance(instance.clone()))?;

    let dispatcher = state.dispatcher.clone();
    let span = tracing::info_span!("operation", op = %op);
    let joined = tokio::task::spawn_blocking(move || span.in_scope(|| dispatcher.dispatch(op, &args))).await;

    let reply = match joined {
        Ok(result) => result.map_err(|e| {
            tracing::warn!(op = %op, error = %e, "Operation rejected");
            ProblemDetails::from(e).with_instance(instance.clone())
        })?,
        Err(e) => {
            tracing::error!(op = %op, error = %e, "Operation panicked");
            return Err(ProblemDetails::internal_error(format!("Operation '{}' failed: {}", op, e))
                .with_instance(instance));
        }
    };

    Ok(match reply {
        Reply::Json(value) => Json(value).into_response(),
        Reply::Array(bytes) => {
            ([(header::CONTENT_TYPE, mt5_wire::CONTENT_TYPE_NUMPY)], bytes).into_response()
        }
    })
}

/// An empty body means no arguments; anything else must be a JSON object
fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ProblemDetails> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ProblemDetails::validation_error(
            "Request body must be a JSON object",
        )),
        Err(e) => Err(ProblemDetails::validation_error(format!(
            "Malformed JSON body: {}",
            e
        ))),
    }
}
