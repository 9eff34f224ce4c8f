mod connection;
mod registry;

use crate::Connection;

use herald_core::Message;

use std::sync::Arc;

use tokio::task::JoinHandle;

/// Two connections joined by an in-memory pipe: (broker side, worker side).
pub(crate) fn connection_pair() -> (Arc<Connection>, Arc<Connection>) {
    let (broker, worker) = tokio::io::duplex(64 * 1024);
    (Connection::spawn(broker, 16), Connection::spawn(worker, 16))
}

/// Worker stand-in: answers every inbound message with `reply`, or stays
/// silent when it returns `None`. Yields everything it received once the
/// connection ends.
pub(crate) fn spawn_responder<F>(worker: Arc<Connection>, reply: F) -> JoinHandle<Vec<Message>>
where
    F: Fn(&Message) -> Option<Message> + Send + 'static,
{
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(message) = worker.receive().await {
            let answer = reply(&message);
            seen.push(message);
            if let Some(answer) = answer
                && worker.send(&answer).await.is_err()
            {
                break;
            }
        }
        seen
    })
}
