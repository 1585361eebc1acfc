use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::stream::SplitStream;
use futures::{Sink, SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::registry::{ConnectionRegistry, HubEvent};

/// Frames queued for a sentinel beyond this are refused with [`SendError::Full`].
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Upper bound on flushing a close frame once the outbound queue is done.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Why a session's read cycle ended. Always terminal for that session.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    #[error("outbound queue is full")]
    Full,
    #[error("session has ended")]
    Ended,
}

/// Handle to one connected sentinel.
///
/// Cloning is cheap; every clone refers to the same connection. The session
/// loop owns the inbound half of the socket. Outbound frames go through a
/// bounded queue drained by a writer task, so [`ClientSession::send`] never
/// blocks and is safe to call from anywhere.
#[derive(Clone)]
pub struct ClientSession {
    id: String,
    connection_id: Uuid,
    connected_at: Instant,
    outbound: mpsc::Sender<Message>,
    ended: CancellationToken,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("connection_id", &self.connection_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl ClientSession {
    /// Create a handle for a freshly promoted connection. Frames passed to
    /// [`ClientSession::send`] come out of the receiving end of `outbound`.
    pub fn new(id: impl Into<String>, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            id: id.into(),
            connection_id: Uuid::new_v4(),
            connected_at: Instant::now(),
            outbound,
            ended: CancellationToken::new(),
        }
    }

    /// The caller-supplied stack identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unique per connection; two connections under the same stack id differ here.
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// Queue a frame for delivery to the sentinel.
    pub fn send(&self, message: Message) -> Result<(), SendError> {
        if self.ended.is_cancelled() {
            return Err(SendError::Ended);
        }
        self.outbound.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Ended,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.ended.is_cancelled()
    }

    /// Resolves once the session loop has deregistered and released the connection.
    pub async fn closed(&self) {
        self.ended.cancelled().await
    }

    pub(crate) fn mark_closed(&self) {
        self.ended.cancel();
    }
}

/// Drive one promoted connection from registration to teardown.
///
/// Registers the session, reads frames until the transport fails or the peer
/// closes, then unregisters exactly once and releases the socket.
pub async fn serve(socket: WebSocket, id: String, registry: ConnectionRegistry) {
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let session = ClientSession::new(id, outbound_tx);
    let connection_id = session.connection_id();

    registry.register(session.clone());
    tracing::info!(stack_id = %session.id(), %connection_id, "sentinel connected");

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_outbound(sink, outbound_rx, session.ended.clone()));

    let reason = read_frames(stream, &session, &registry).await;

    registry.unregister(session.id());
    session.mark_closed();
    if let Err(e) = writer.await {
        tracing::warn!(stack_id = %session.id(), error = %e, "writer task failed");
    }

    tracing::info!(
        stack_id = %session.id(),
        %connection_id,
        reason = %reason,
        duration_ms = session.connected_at().elapsed().as_millis() as u64,
        "sentinel disconnected"
    );
}

async fn read_frames(
    mut stream: SplitStream<WebSocket>,
    session: &ClientSession,
    registry: &ConnectionRegistry,
) -> ReadError {
    loop {
        let payload = match stream.next().await {
            Some(Ok(Message::Text(text))) => Bytes::copy_from_slice(text.as_str().as_bytes()),
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Close(_))) | None => return ReadError::PeerClosed,
            // Ping/Pong handled automatically
            Some(Ok(_)) => continue,
            Some(Err(e)) => return ReadError::Transport(e),
        };

        tracing::info!(
            stack_id = %session.id(),
            bytes = payload.len(),
            payload = %String::from_utf8_lossy(&payload),
            "message received"
        );
        registry.publish(HubEvent::Frame {
            id: session.id().to_owned(),
            connection_id: session.connection_id(),
            payload,
        });
    }
}

async fn write_outbound<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Message>,
    ended: CancellationToken,
) where
    S: Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            _ = ended.cancelled() => break,
            message = outbound.recv() => {
                let Some(message) = message else { break };
                // A peer that stops reading must not pin the socket past teardown.
                tokio::select! {
                    _ = ended.cancelled() => return,
                    sent = sink.send(message) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
    let _ = tokio::time::timeout(CLOSE_GRACE, sink.close()).await;
}
