use crate::frame::{read_frame, write_frame};
use crate::{BrokerError, ConnectionId, Result as BrokerResult};

use herald_core::{Message, MessageType};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, MutexGuard, mpsc, watch};
use tokio::task::AbortHandle;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type Inbound = mpsc::Receiver<BrokerResult<Message>>;

/// Lifecycle of a connection as observed by its reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    /// The peer sent `DEREGISTER`; frames are still delivered.
    Deregistered,
    Closed,
}

/// A framed, bidirectional message channel over one stream.
///
/// A background reader decodes frames into a bounded queue, so `receive()`
/// can be cancelled at any point without losing part of a frame. Writes go
/// through a lock; a write interrupted by cancellation closes the connection
/// because the peer has seen a partial frame.
pub struct Connection {
    id: ConnectionId,
    writer: Mutex<BoxedWriter>,
    inbound: Mutex<Inbound>,
    state: Arc<watch::Sender<ConnectionState>>,
    deregistered: Arc<AtomicBool>,
    reader: AbortHandle,
}

impl Connection {
    /// Split `stream` and start its reader task.
    pub fn spawn<S>(stream: S, inbound_capacity: usize) -> Arc<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_parts(reader, writer, inbound_capacity)
    }

    pub fn from_parts<R, W>(reader: R, writer: W, inbound_capacity: usize) -> Arc<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(inbound_capacity.max(1));
        let (state, _) = watch::channel(ConnectionState::Open);
        let state = Arc::new(state);
        let deregistered = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(pump(
            id,
            reader,
            tx,
            Arc::clone(&state),
            Arc::clone(&deregistered),
        ))
        .abort_handle();

        Arc::new(Self {
            id,
            writer: Mutex::new(Box::new(writer)),
            inbound: Mutex::new(rx),
            state,
            deregistered,
            reader,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Whether the peer ever sent `DEREGISTER`. Unlike `state()`, closing the
    /// connection afterwards does not clear it.
    pub fn has_deregistered(&self) -> bool {
        self.deregistered.load(Ordering::Acquire)
    }

    /// Watch state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Resolves once the connection is closed by either side.
    pub async fn closed(&self) {
        let mut changes = self.state.subscribe();
        let _ = changes
            .wait_for(|state| *state == ConnectionState::Closed)
            .await;
    }

    /// Exclusive access to the write side. Holding it keeps every other
    /// sender waiting, which lets a caller make a state change and the
    /// matching reply appear atomic to the peer.
    pub async fn outbound(&self) -> Outbound<'_> {
        Outbound {
            connection: self,
            writer: self.writer.lock().await,
        }
    }

    pub async fn send(&self, message: &Message) -> BrokerResult<()> {
        self.outbound().await.send(message).await
    }

    /// Next inbound message, or the error that ended the stream.
    pub async fn receive(&self) -> BrokerResult<Message> {
        let mut inbound = self.inbound.lock().await;
        match inbound.recv().await {
            Some(result) => result,
            None => Err(BrokerError::closed("stream ended")),
        }
    }

    /// Drop inbound messages nobody has asked for yet, such as late replies
    /// to a round that already timed out. Returns how many were dropped.
    pub fn discard_pending(&self) -> usize {
        let Ok(mut inbound) = self.inbound.try_lock() else {
            return 0;
        };

        let mut discarded = 0;
        while let Ok(stale) = inbound.try_recv() {
            match stale {
                Ok(message) => debug!("Connection {} discarded stale {message}", self.id),
                Err(e) => debug!("Connection {} discarded stale error: {e}", self.id),
            }
            discarded += 1;
        }
        discarded
    }

    /// Shut down the write side so the peer reads end of stream, then close.
    pub async fn shutdown(&self) -> BrokerResult<()> {
        let result = self.writer.lock().await.shutdown().await;
        self.close();
        result?;
        Ok(())
    }

    /// Stop reading and mark the connection closed. Frames already queued
    /// can still be received.
    pub fn close(&self) {
        self.reader.abort();
        self.state.send_if_modified(|state| {
            let changed = *state != ConnectionState::Closed;
            *state = ConnectionState::Closed;
            changed
        });
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Locked write side of a [`Connection`].
pub struct Outbound<'a> {
    connection: &'a Connection,
    writer: MutexGuard<'a, BoxedWriter>,
}

impl Outbound<'_> {
    pub async fn send(&mut self, message: &Message) -> BrokerResult<()> {
        if self.connection.is_closed() {
            return Err(BrokerError::closed("connection already closed"));
        }

        let mut pending = PartialWrite {
            connection: self.connection,
            armed: true,
        };
        let result = write_frame(&mut *self.writer, message).await;
        pending.armed = false;

        result
    }
}

/// Closes the connection if a frame write is abandoned half way.
struct PartialWrite<'a> {
    connection: &'a Connection,
    armed: bool,
}

impl Drop for PartialWrite<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                "Write on connection {} was interrupted, closing it",
                self.connection.id
            );
            self.connection.close();
        }
    }
}

async fn pump<R>(
    id: ConnectionId,
    mut reader: R,
    tx: mpsc::Sender<BrokerResult<Message>>,
    state: Arc<watch::Sender<ConnectionState>>,
    deregistered: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(message)) => {
                let deregister = message.is_type(MessageType::Deregister);
                if deregister {
                    // Set before queuing: a reader that drops the queued
                    // message still sees the departure.
                    deregistered.store(true, Ordering::Release);
                }

                // Queue first: whoever reacts to the state change may close
                // the connection, and the message must already be readable.
                if tx.send(Ok(message)).await.is_err() {
                    break;
                }

                if deregister {
                    state.send_if_modified(|state| {
                        let open = *state == ConnectionState::Open;
                        if open {
                            *state = ConnectionState::Deregistered;
                        }
                        open
                    });
                }
            }
            Ok(None) => {
                debug!("Connection {id} closed by peer");
                state.send_replace(ConnectionState::Closed);
                let _ = tx.try_send(Err(BrokerError::closed("closed by peer")));
                break;
            }
            Err(e) => {
                debug!("Connection {id} read failed: {e}");
                state.send_replace(ConnectionState::Closed);
                let _ = tx.try_send(Err(e));
                break;
            }
        }
    }
}
