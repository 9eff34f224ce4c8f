#![allow(dead_code)]

use herald_broker::Connection;
use herald_core::{Message, MessageType};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(3);

/// Protocol-level worker driven step by step from a test.
pub struct TestWorker {
    pub connection: Arc<Connection>,
}

impl TestWorker {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            connection: Connection::spawn(stream, 16),
        }
    }

    /// Connect and complete the handshake as `name`.
    pub async fn register(addr: SocketAddr, name: &str) -> Self {
        let worker = Self::connect(addr).await;
        let reply = worker.propose(name).await;
        assert!(
            reply.is_type(MessageType::Registered),
            "expected REGISTERED, got {reply}"
        );
        worker
    }

    pub async fn receive(&self) -> Message {
        timeout(RECEIVE_TIMEOUT, self.connection.receive())
            .await
            .expect("timed out waiting for a message")
            .expect("connection failed")
    }

    pub async fn send(&self, message: Message) {
        self.connection.send(&message).await.unwrap();
    }

    /// Wait for a probe, answer it with `name`, and return the broker's reply.
    pub async fn propose(&self, name: &str) -> Message {
        let probe = self.receive().await;
        assert!(
            probe.is_type(MessageType::Heartbeat),
            "expected HEARTBEAT, got {probe}"
        );
        self.send(Message::with_data(MessageType::Heartbeat, name))
            .await;
        self.receive().await
    }

    /// Answer the next push with a matching RESPONSE and return it.
    pub async fn confirm_next(&self) -> Message {
        let push = self.receive().await;
        assert!(push.is_type(MessageType::ServerPush), "expected push, got {push}");
        self.send(Message::response(push.id())).await;
        push
    }

    /// Confirm every push in the background until the connection ends.
    pub fn confirm_all(&self) -> JoinHandle<Vec<Message>> {
        let connection = Arc::clone(&self.connection);
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Ok(push) = connection.receive().await {
                if connection.send(&Message::response(push.id())).await.is_err() {
                    break;
                }
                seen.push(push);
            }
            seen
        })
    }

    /// Record pushes in the background without ever answering.
    pub fn ignore_all(&self) -> JoinHandle<Vec<Message>> {
        let connection = Arc::clone(&self.connection);
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Ok(push) = connection.receive().await {
                seen.push(push);
            }
            seen
        })
    }

    pub fn disconnect(self) {
        self.connection.close();
    }
}
