//! Inbound side: an HTTP listener that turns webhook deliveries into a stream
//! of messages.
//!
//! Deliveries are handed to the consumer one at a time. A request is only
//! answered once the consumer has taken its message, so a slow consumer slows
//! down the remote service instead of piling messages up in memory.

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
    Router,
};
use futures::Stream;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::types::{Message, Update};

struct Delivery {
    message: Message,
    accepted: oneshot::Sender<()>,
}

/// Messages received by a webhook listener, in arrival order.
pub struct Updates {
    rx: mpsc::Receiver<Delivery>,
    local_addr: SocketAddr,
}

impl Updates {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the next message. Returns `None` once the listener is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await.map(accept)
    }
}

impl Stream for Updates {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        self.rx.poll_recv(cx).map(|delivery| delivery.map(accept))
    }
}

fn accept(delivery: Delivery) -> Message {
    // The handler may have given up waiting; the message is still delivered.
    let _ = delivery.accepted.send(());
    delivery.message
}

#[derive(Clone)]
struct ReceiverState {
    tx: mpsc::Sender<Delivery>,
}

/// Binds `addr` and starts serving webhook deliveries on any path.
///
/// Bind failures are returned. Once bound, a failure of the server itself is
/// unrecoverable and exits the process.
pub async fn listen(addr: &str) -> Result<Updates> {
    let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
        addr: addr.to_string(),
        source,
    })?;
    let local_addr = listener.local_addr().map_err(|source| Error::Bind {
        addr: addr.to_string(),
        source,
    })?;

    // One slot: the handler additionally waits for the consumer's ack.
    let (tx, rx) = mpsc::channel(1);
    let app = router(ReceiverState { tx });

    info!("Webhook listener bound on {}", local_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Webhook listener on {} failed: {}", local_addr, e);
            std::process::exit(1);
        }
    });

    Ok(Updates { rx, local_addr })
}

fn router(state: ReceiverState) -> Router {
    Router::new()
        .route("/", post(handle_delivery))
        .route("/{*path}", post(handle_delivery))
        // A 413 would make the remote service retry the delivery.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Always answers 200, even for bodies that fail to decode, so the remote
/// service never retries a delivery.
async fn handle_delivery(State(state): State<ReceiverState>, body: Bytes) -> StatusCode {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Error decoding webhook body: {}", e);
            return StatusCode::OK;
        }
    };

    let update_id = update.id;
    debug!("Received update {} (message {})", update_id, update.message.id);

    let (accepted, ack) = oneshot::channel();
    let delivery = Delivery {
        message: update.message,
        accepted,
    };
    if state.tx.send(delivery).await.is_err() {
        warn!("No consumer for update {}, dropping it", update_id);
        return StatusCode::OK;
    }
    if ack.await.is_err() {
        warn!("Consumer went away before taking update {}", update_id);
    }

    StatusCode::OK
}
