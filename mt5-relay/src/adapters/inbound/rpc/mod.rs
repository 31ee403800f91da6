//! Object-RPC transport
//!
//! A ZeroMQ ROUTER socket receives MessagePack `{id, method, args}` frames.
//! Every call runs on its own thread; finished replies come back to the
//! socket-owning thread over an inproc PUSH/PULL pair and are routed to the
//! caller by their envelope.

mod codec;


pub use codec::handle_frame;

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::task::JoinHandle;

use crate::application::Dispatcher;

const REPLY_ENDPOINT: &str = "inproc://mt5-relay-rpc-replies";
const POLL_TIMEOUT_MS: i64 = 100;
const REPLY_LINGER_MS: i32 = 1000;
/// Bounds a worker's send when the socket thread is gone or not reading
const REPLY_SEND_TIMEOUT_MS: i32 = 1000;

pub struct RpcServer {
    context: zmq::Context,
    dispatcher: Arc<Dispatcher>,
    shutdown: Arc<AtomicBool>,
}

impl RpcServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            context: zmq::Context::new(),
            dispatcher,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn start(&self, bind_address: &str) -> Result<JoinHandle<()>> {
        let router = self
            .context
            .socket(zmq::ROUTER)
            .context("Failed to create ZMQ ROUTER socket")?;
        router
            .set_linger(0)
            .context("Failed to set linger on ROUTER socket")?;
        router
            .bind(bind_address)
            .context(format!("Failed to bind to {}", bind_address))?;

        let replies = self
            .context
            .socket(zmq::PULL)
            .context("Failed to create ZMQ PULL socket")?;
        replies
            .bind(REPLY_ENDPOINT)
            .context(format!("Failed to bind to {}", REPLY_ENDPOINT))?;

        tracing::info!("RPC server started on {}", bind_address);

        let context = self.context.clone();
        let dispatcher = self.dispatcher.clone();
        let shutdown = self.shutdown.clone();

        // ZMQ is blocking; the loop owns both sockets
        let handle = tokio::task::spawn_blocking(move || {
            let mut calls: u64 = 0;

            while !shutdown.load(Ordering::Relaxed) {
                let mut items = [
                    router.as_poll_item(zmq::POLLIN),
                    replies.as_poll_item(zmq::POLLIN),
                ];
                if let Err(e) = zmq::poll(&mut items, POLL_TIMEOUT_MS) {
                    tracing::error!("Failed to poll RPC sockets: {}", e);
                    break;
                }
                let (inbound, outbound) = (items[0].is_readable(), items[1].is_readable());

                if outbound {
                    forward_reply(&replies, &router);
                }
                if inbound {
                    match router.recv_multipart(zmq::DONTWAIT) {
                        Err(zmq::Error::EAGAIN) => continue,
                        Ok(frames) => {
                            calls += 1;
                            spawn_call(&context, &dispatcher, calls, frames);
                        }
                        Err(e) => {
                            tracing::error!("Failed to receive RPC frame: {}", e);
                            break;
                        }
                    }
                }
            }

            drop(replies);
            drop(router);
            tracing::info!("RPC server shut down cleanly");
        });

        Ok(handle)
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Run one call on its own thread. The reply keeps the caller's routing
/// envelope (identity plus any delimiter frames).
fn spawn_call(context: &zmq::Context, dispatcher: &Arc<Dispatcher>, seq: u64, mut frames: Vec<Vec<u8>>) {
    let Some(body) = frames.pop() else {
        return;
    };
    if frames.is_empty() {
        tracing::warn!("Dropping RPC frame without routing envelope");
        return;
    }

    let context = context.clone();
    let dispatcher = dispatcher.clone();
    let spawned = thread::Builder::new()
        .name(format!("rpc-call-{}", seq))
        .spawn(move || {
            let reply = handle_frame(&dispatcher, &body);
            frames.push(reply);
            if let Err(e) = push_reply(&context, frames) {
                tracing::warn!("Dropping RPC reply, socket thread not reading: {:#}", e);
            }
        });

    if let Err(e) = spawned {
        tracing::error!("Failed to spawn RPC worker thread: {}", e);
    }
}

fn push_reply(context: &zmq::Context, frames: Vec<Vec<u8>>) -> Result<()> {
    let push = context
        .socket(zmq::PUSH)
        .context("Failed to create ZMQ PUSH socket")?;
    push.set_linger(REPLY_LINGER_MS)
        .context("Failed to set linger on PUSH socket")?;
    push.set_sndtimeo(REPLY_SEND_TIMEOUT_MS)
        .context("Failed to set send timeout on PUSH socket")?;
    push.connect(REPLY_ENDPOINT)
        .context(format!("Failed to connect to {}", REPLY_ENDPOINT))?;
    push.send_multipart(frames, 0)
        .context("Failed to send reply frames")?;
    Ok(())
}

fn forward_reply(replies: &zmq::Socket, router: &zmq::Socket) {
    loop {
        match replies.recv_multipart(zmq::DONTWAIT) {
            Ok(frames) => {
                if let Err(e) = router.send_multipart(frames, 0) {
                    // Caller disconnected or timed out
                    tracing::warn!("Failed to send RPC reply: {}", e);
                }
            }
            Err(zmq::Error::EAGAIN) => break,
            Err(e) => {
                tracing::error!("Failed to receive RPC reply from worker: {}", e);
                break;
            }
        }
    }
}
