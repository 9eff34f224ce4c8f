#![allow(dead_code)]

use herald_broker::{
    BroadcastDispatcher, Connection, ConnectionHandler, Metrics, ShutdownCoordinator,
    WorkerRegistry,
};
use herald_config::DispatchConfig;
use herald_store::PriorityBuffer;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TEST_BUFFER_CAPACITY: usize = 64;
pub const TEST_ROUND_TIMEOUT_MS: u64 = 400;

/// Broker with a real listener and connection handlers, but no generator and
/// no dispatcher loop: tests push messages and run rounds themselves.
pub struct TestBroker {
    pub addr: SocketAddr,
    pub buffer: Arc<PriorityBuffer>,
    pub registry: WorkerRegistry,
    pub dispatcher: BroadcastDispatcher,
    pub shutdown: ShutdownCoordinator,
    accept_task: JoinHandle<()>,
}

impl TestBroker {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let buffer = Arc::new(PriorityBuffer::new(TEST_BUFFER_CAPACITY));
        let registry = WorkerRegistry::new();
        let shutdown = ShutdownCoordinator::new();
        let config = DispatchConfig {
            round_timeout_ms: TEST_ROUND_TIMEOUT_MS,
            ..DispatchConfig::default()
        };
        let dispatcher = BroadcastDispatcher::new(
            Arc::clone(&buffer),
            registry.clone(),
            Metrics::new(),
            &config,
        );

        let accept_task = {
            let registry = registry.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let handler = ConnectionHandler::new(
                        Connection::spawn(stream, 16),
                        registry.clone(),
                        Metrics::new(),
                        shutdown.subscribe_guard(),
                    );
                    tokio::spawn(async move {
                        let _ = handler.handle().await;
                    });
                }
            })
        };

        Self {
            addr,
            buffer,
            registry,
            dispatcher,
            shutdown,
            accept_task,
        }
    }

    /// Poll until `name` is (or is no longer) registered.
    pub async fn wait_for(&self, name: &str, registered: bool) -> bool {
        for _ in 0..100 {
            if self.registry.contains(name) == registered {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

impl Drop for TestBroker {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        self.accept_task.abort();
    }
}
