// Location: mt5-relay/src/adapters/inbound/rpc/codec.rs
// Purpose: Turn one inbound MessagePack frame into one reply frame
// Why: The socket loop stays free of dispatch logic and panics never reach it

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use mt5_wire::{FaultKind, RpcOutcome, RpcRequest, RpcResponse};

use crate::application::{DispatchError, Dispatcher, ErrorClass, Reply};

/// Decode, dispatch and encode one call. Always yields a reply frame.
pub fn handle_frame(dispatcher: &Dispatcher, frame: &[u8]) -> Vec<u8> {
    let response = match RpcRequest::decode(frame) {
        Ok(request) => {
            tracing::debug!(id = request.id, method = %request.method, "RPC call received");
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                dispatcher.dispatch_named(&request.method, &request.args)
            }));
            respond(request.id, &request.method, result)
        }
        Err(e) => {
            tracing::warn!(bytes = frame.len(), error = %e, "Malformed RPC request");
            RpcResponse::fault(0, FaultKind::Client, format!("Malformed request: {}", e))
        }
    };

    encode(response)
}

fn respond(
    id: u64,
    method: &str,
    result: Result<Result<Reply, DispatchError>, Box<dyn Any + Send>>,
) -> RpcResponse {
    match result {
        Ok(Ok(Reply::Json(value))) => RpcResponse {
            id,
            outcome: RpcOutcome::Value(value),
        },
        Ok(Ok(Reply::Array(bytes))) => RpcResponse {
            id,
            outcome: RpcOutcome::Array(bytes),
        },
        Ok(Err(e)) => {
            tracing::warn!(id, method, error = %e, "RPC call rejected");
            let kind = match e.class() {
                ErrorClass::Client => FaultKind::Client,
                ErrorClass::Internal => FaultKind::Internal,
            };
            RpcResponse::fault(id, kind, e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(id, method, panic = %message, "RPC call panicked");
            RpcResponse::fault(id, FaultKind::Internal, format!("Operation '{}' failed: {}", method, message))
        }
    }
}

fn encode(response: RpcResponse) -> Vec<u8> {
    match response.encode() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(id = response.id, error = %e, "Failed to encode RPC reply");
            RpcResponse::fault(response.id, FaultKind::Internal, format!("Failed to encode reply: {}", e))
                .encode()
                .unwrap_or_default()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
