//! Transports. Both are thin codecs over [`crate::application::Dispatcher`].

pub mod http;
pub mod rpc;
