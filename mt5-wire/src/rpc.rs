// Location: mt5-wire/src/rpc.rs
// Purpose: Object-RPC frames exchanged over the ZeroMQ channel
// Why: Server and client must agree on one MessagePack shape for calls and replies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::WireError;

/// Inbound call: operation name plus named arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// Reply to one [`RpcRequest`], correlated by `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    pub outcome: RpcOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RpcOutcome {
    /// Structured result, delivered as a native map/array/scalar
    Value(Value),
    /// Time series as a `.npy` payload
    Array(#[serde(with = "serde_bytes")] Vec<u8>),
    Fault(Fault),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultKind {
    /// Malformed request, unknown method or missing argument
    Client,
    Internal,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FaultKind::Client => "client",
            FaultKind::Internal => "internal",
        };
        write!(f, "{} fault: {}", kind, self.message)
    }
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id,
            method: method.into(),
            args,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        Ok(rmp_serde::from_slice(data)?)
    }
}

impl RpcResponse {
    pub fn fault(id: u64, kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            id,
            outcome: RpcOutcome::Fault(Fault {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        Ok(rmp_serde::from_slice(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_args_decodes_to_empty_map() {
        #[derive(Serialize)]
        struct Bare<'a> {
            id: u64,
            method: &'a str,
        }
        let bytes = rmp_serde::to_vec_named(&Bare {
            id: 9,
            method: "version",
        })
        .unwrap();

        let request = RpcRequest::decode(&bytes).unwrap();
        assert_eq!(request.id, 9);
        assert_eq!(request.method, "version");
        assert!(request.args.is_empty());
    }

    #[test]
    fn test_request_keeps_argument_types() {
        let mut args = Map::new();
        args.insert("login".into(), json!(123));
        args.insert("server".into(), json!("demo"));
        let request = RpcRequest::new(1, "initialize", args);

        let back = RpcRequest::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(back.args["login"], json!(123));
        assert_eq!(back.args["server"], json!("demo"));
    }

    #[test]
    fn test_array_outcome_is_binary() {
        let response = RpcResponse {
            id: 3,
            outcome: RpcOutcome::Array(vec![0x93, b'N', b'U']),
        };
        let bytes = response.encode().unwrap();

        // bin8 marker followed by the length
        assert!(bytes.windows(2).any(|w| w == [0xc4, 3]));
        assert_eq!(RpcResponse::decode(&bytes).unwrap(), response);
    }

    #[test]
    fn test_fault_kind_is_lowercase() {
        let response = RpcResponse::fault(4, FaultKind::Client, "unknown operation 'nope'");
        let value: Value = rmp_serde::from_slice(&response.encode().unwrap()).unwrap();

        assert_eq!(value["outcome"]["Fault"]["kind"], json!("client"));
        assert_eq!(
            value["outcome"]["Fault"]["message"],
            json!("unknown operation 'nope'")
        );
    }
}
