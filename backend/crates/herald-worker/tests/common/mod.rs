#![allow(dead_code)]

use herald_broker::{BrokerServer, BrokerState, Result as BrokerResult, ShutdownCoordinator};
use herald_config::Config;

use std::net::SocketAddr;
use std::time::Duration;

use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const WAIT: Duration = Duration::from_secs(5);

/// A real broker on an ephemeral port, generating a few pushes per tick.
pub struct RunningBroker {
    pub addr: SocketAddr,
    pub state: BrokerState,
    pub shutdown: ShutdownCoordinator,
    pub serving: JoinHandle<BrokerResult<()>>,
    _overflow: TempDir,
}

impl RunningBroker {
    pub async fn start() -> Self {
        let overflow = TempDir::new().unwrap();
        let mut config = Config::default();
        config.server.port = 0;
        config.generator.messages_per_tick = 2;
        config.generator.tick_interval_ms = 50;
        config.generator.buffer_capacity = 16;
        config.generator.overflow_dir = overflow.path().to_string_lossy().into_owned();
        config.dispatch.round_timeout_ms = 500;

        let shutdown = ShutdownCoordinator::new();
        let server = BrokerServer::bind(&config, shutdown.clone()).await.unwrap();
        let addr = server.local_addr();
        let state = server.state().clone();
        let serving = tokio::spawn(server.serve());

        Self {
            addr,
            state,
            shutdown,
            serving,
            _overflow: overflow,
        }
    }

    /// Wait until `name` is (or is no longer) registered.
    pub async fn wait_for(&self, name: &str, registered: bool) {
        tokio::time::timeout(WAIT, async {
            while self.state.registry.contains(name) != registered {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    pub async fn stop(self) {
        self.shutdown.shutdown();
        tokio::time::timeout(WAIT, self.serving)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
