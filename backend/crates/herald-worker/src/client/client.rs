use crate::client::error::{Result as WorkerResult, WorkerError};

use herald_broker::Connection;
use herald_core::{Message, MessageType};

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::TcpStream;

/// Frames the broker may queue ahead of the worker.
pub const INBOUND_CAPACITY: usize = 16;

/// Worker side of the broker protocol.
///
/// Answers the broker's heartbeat probe with its name, then confirms every
/// `SERVER_PUSH` with a `RESPONSE` echoing the push id after a fixed
/// processing delay. Redelivered pushes are processed and confirmed again.
pub struct WorkerClient {
    connection: Arc<Connection>,
    name: String,
    process_delay: Duration,
}

impl WorkerClient {
    pub async fn connect(
        host: &str,
        port: u16,
        name: impl Into<String>,
        process_delay: Duration,
    ) -> WorkerResult<Self> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| WorkerError::connect(&addr, e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| WorkerError::connect(&addr, e))?;

        info!("Connected to broker at {addr}");
        Ok(Self::from_connection(
            Connection::spawn(stream, INBOUND_CAPACITY),
            name,
            process_delay,
        ))
    }

    pub fn from_connection(
        connection: Arc<Connection>,
        name: impl Into<String>,
        process_delay: Duration,
    ) -> Self {
        Self {
            connection,
            name: name.into(),
            process_delay,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn process_delay(&self) -> Duration {
        self.process_delay
    }

    /// Answer probes until the broker accepts the name.
    ///
    /// A rejected name is simply probed again, so this only returns once
    /// `REGISTERED` arrives or the connection fails.
    pub async fn handshake(&self) -> WorkerResult<()> {
        loop {
            let message = self.connection.receive().await?;
            match message.message_type() {
                MessageType::Heartbeat => {
                    debug!("Probe received, proposing '{}'", self.name);
                    self.connection
                        .send(&Message::with_data(MessageType::Heartbeat, self.name.as_str()))
                        .await?;
                }
                MessageType::Registered => {
                    info!("Registered as '{}'", self.name);
                    return Ok(());
                }
                other => return Err(WorkerError::unexpected("HEARTBEAT or REGISTERED", other)),
            }
        }
    }

    /// Wait for the next push.
    pub async fn next_push(&self) -> WorkerResult<Message> {
        let message = self.connection.receive().await?;
        if !message.is_type(MessageType::ServerPush) {
            return Err(WorkerError::unexpected("SERVER_PUSH", message.message_type()));
        }
        Ok(message)
    }

    /// Spend the processing delay on `push`.
    pub async fn process(&self, push: &Message) {
        debug!("Processing {}", push.id());
        tokio::time::sleep(self.process_delay).await;
    }

    /// Reply `RESPONSE` echoing the id of `push`.
    pub async fn confirm(&self, push: &Message) -> WorkerResult<()> {
        self.connection.send(&Message::response(push.id())).await?;
        debug!("Confirmed {}", push.id());
        Ok(())
    }

    /// Receive, process, and confirm one push.
    pub async fn process_next(&self) -> WorkerResult<Message> {
        let push = self.next_push().await?;
        self.process(&push).await;
        self.confirm(&push).await?;
        Ok(push)
    }

    /// Process, echo to stdout, and confirm pushes until `shutdown`
    /// resolves, then deregister. Returns how many pushes were confirmed.
    pub async fn run<F>(&self, shutdown: F) -> WorkerResult<u64>
    where
        F: Future<Output = ()>,
    {
        self.run_to(shutdown, std::io::stdout()).await
    }

    /// Same as [`run`](Self::run), echoing into `out`.
    pub async fn run_to<F, W>(&self, shutdown: F, mut out: W) -> WorkerResult<u64>
    where
        F: Future<Output = ()>,
        W: Write,
    {
        tokio::pin!(shutdown);
        let mut processed = 0;

        loop {
            let push = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                push = self.next_push() => push?,
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.process(&push) => {}
            }

            if let Err(e) = writeln!(out, "{}", echo_line(&push)) {
                warn!("Failed to echo {}: {e}", push.id());
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                confirmed = self.confirm(&push) => confirmed?,
            }
            processed += 1;
        }

        info!("Shutting down after {processed} confirmed push(es)");
        self.deregister().await?;
        Ok(processed)
    }

    /// Tell the broker this worker is leaving, then close the connection.
    pub async fn deregister(&self) -> WorkerResult<()> {
        self.connection
            .send(&Message::new(MessageType::Deregister))
            .await?;
        self.connection.shutdown().await?;
        info!("Deregistered '{}'", self.name);
        Ok(())
    }
}

/// Console line for a processed push: `<data>: priority - <PRIORITY>`.
pub fn echo_line(push: &Message) -> String {
    let priority = push
        .priority()
        .map(|priority| priority.as_str().to_string())
        .unwrap_or_default();
    format!("{}: priority - {priority}", push.data().unwrap_or_default())
}
