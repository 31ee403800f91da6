// Location: mt5-relay/src/client.rs
// Purpose: Blocking object-RPC client for the relay server
// Why: Shared by the reference client binary and the transport tests

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use std::time::Duration;

use mt5_wire::npy::{self, ArrayRecord};
use mt5_wire::{RpcOutcome, RpcRequest, RpcResponse};

/// REQ-socket client. One call in flight at a time.
pub struct RpcClient {
    context: zmq::Context,
    endpoint: String,
    timeout: Duration,
    socket: zmq::Socket,
    next_id: u64,
}

impl RpcClient {
    pub fn connect(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let context = zmq::Context::new();
        let endpoint = endpoint.into();
        let socket = open_socket(&context, &endpoint, timeout)?;
        Ok(Self {
            context,
            endpoint,
            timeout,
            socket,
            next_id: 1,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one call and wait for its outcome. A timed-out REQ socket
    /// cannot send again, so it is rebuilt before the error is returned.
    pub fn call(&mut self, method: &str, args: Map<String, Value>) -> Result<RpcOutcome> {
        let id = self.next_id;
        self.next_id += 1;

        let frame = RpcRequest::new(id, method, args)
            .encode()
            .context("Failed to encode RPC request")?;
        self.socket
            .send(frame, 0)
            .context(format!("Failed to send '{}' to {}", method, self.endpoint))?;

        let bytes = match self.socket.recv_bytes(0) {
            Ok(bytes) => bytes,
            Err(zmq::Error::EAGAIN) => {
                self.socket = open_socket(&self.context, &self.endpoint, self.timeout)?;
                bail!(
                    "'{}' timed out after {}s waiting for {}",
                    method,
                    self.timeout.as_secs(),
                    self.endpoint
                );
            }
            Err(e) => return Err(e).context(format!("Failed to receive reply to '{}'", method)),
        };

        let response = RpcResponse::decode(&bytes).context("Failed to decode RPC reply")?;
        if response.id != id {
            bail!("Reply id {} does not match request id {}", response.id, id);
        }
        Ok(response.outcome)
    }

    /// Call an operation that answers with a structured value
    pub fn call_value(&mut self, method: &str, args: Map<String, Value>) -> Result<Value> {
        match self.call(method, args)? {
            RpcOutcome::Value(value) => Ok(value),
            RpcOutcome::Fault(fault) => Err(anyhow!("'{}' failed: {}", method, fault)),
            RpcOutcome::Array(_) => Err(anyhow!("'{}' answered with an array", method)),
        }
    }

    /// Call a time-series operation. A failed terminal call arrives as a
    /// structured value and is returned as an error.
    pub fn call_array<T: ArrayRecord>(&mut self, method: &str, args: Map<String, Value>) -> Result<Vec<T>> {
        match self.call(method, args)? {
            RpcOutcome::Array(bytes) => Ok(npy::decode(&bytes)?),
            RpcOutcome::Value(value) => Err(anyhow!("'{}' failed: {}", method, value)),
            RpcOutcome::Fault(fault) => Err(anyhow!("'{}' failed: {}", method, fault)),
        }
    }
}

fn open_socket(context: &zmq::Context, endpoint: &str, timeout: Duration) -> Result<zmq::Socket> {
    let socket = context
        .socket(zmq::REQ)
        .context("Failed to create ZMQ REQ socket")?;
    let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    socket
        .set_rcvtimeo(timeout_ms)
        .context("Failed to set receive timeout")?;
    socket.set_linger(0).context("Failed to set linger")?;
    socket
        .connect(endpoint)
        .context(format!("Failed to connect to {}", endpoint))?;
    Ok(socket)
}
