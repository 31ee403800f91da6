//! Wire vocabulary shared by the MT5 relay server and its clients.
//!
//! Record types mirror the terminal binding's named tuples, [`rpc`] defines the
//! MessagePack frames of the object-RPC channel and [`npy`] packs time series
//! into NumPy arrays.

pub mod constants;
pub mod errors;
pub mod npy;
pub mod rpc;
pub mod types;

pub use constants::*;
pub use errors::WireError;
pub use rpc::{Fault, FaultKind, RpcOutcome, RpcRequest, RpcResponse};
pub use types::*;
