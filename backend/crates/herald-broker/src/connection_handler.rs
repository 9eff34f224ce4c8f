use crate::{
    Connection, ConnectionState, Metrics, RegistrationGuard, Result as BrokerResult,
    ShutdownGuard, WorkerRegistry,
};

use herald_core::{Message, MessageType};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

/// Pause between handshake probes after a rejected or unexpected reply.
pub const REPROBE_DELAY: Duration = Duration::from_millis(200);

/// Drives one accepted connection: handshake, then supervision until the
/// worker leaves, the stream fails, or the server shuts down.
pub struct ConnectionHandler {
    connection: Arc<Connection>,
    registry: WorkerRegistry,
    metrics: Metrics,
    shutdown: ShutdownGuard,
}

impl ConnectionHandler {
    pub fn new(
        connection: Arc<Connection>,
        registry: WorkerRegistry,
        metrics: Metrics,
        shutdown: ShutdownGuard,
    ) -> Self {
        Self {
            connection,
            registry,
            metrics,
            shutdown,
        }
    }

    /// Probe with `HEARTBEAT` until the worker answers with an acceptable
    /// name, then register it and reply `REGISTERED`.
    pub async fn handshake(&self) -> BrokerResult<RegistrationGuard> {
        handshake(&self.connection, &self.registry, &self.metrics).await
    }

    /// Run the connection to completion. The registry entry is released on
    /// every exit path.
    pub async fn handle(self) -> BrokerResult<()> {
        let Self {
            connection,
            registry,
            metrics,
            mut shutdown,
        } = self;
        let id = connection.id();
        metrics.connection_accepted();

        let registered = tokio::select! {
            result = handshake(&connection, &registry, &metrics) => result,
            _ = shutdown.wait() => {
                debug!("Connection {id} closed during handshake by shutdown");
                connection.close();
                metrics.connection_closed("shutdown");
                return Ok(());
            }
        };

        let guard = match registered {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Handshake on connection {id} failed: {e}");
                connection.close();
                metrics.connection_closed("handshake_failed");
                return Err(e);
            }
        };

        metrics.worker_registered();
        info!("Worker '{}' ready on connection {id}", guard.name());

        let mut changes = connection.state_changes();
        let reason = tokio::select! {
            state = changes.wait_for(|state| *state != ConnectionState::Open) => {
                match state.map(|state| *state) {
                    Ok(ConnectionState::Deregistered) => "deregistered",
                    _ => "closed",
                }
            }
            _ = shutdown.wait() => "shutdown",
        };

        if registry.release(guard.name(), id) {
            metrics.worker_removed(reason);
        }
        info!("Worker '{}' left ({reason})", guard.name());
        drop(guard);

        connection.close();
        metrics.connection_closed(reason);
        Ok(())
    }
}

/// Rejected names and unexpected replies are re-probed forever; only an IO
/// failure ends the handshake.
async fn handshake(
    connection: &Arc<Connection>,
    registry: &WorkerRegistry,
    metrics: &Metrics,
) -> BrokerResult<RegistrationGuard> {
    loop {
        connection.send(&Message::new(MessageType::Heartbeat)).await?;
        let reply = connection.receive().await?;

        if !reply.is_type(MessageType::Heartbeat) {
            warn!(
                "Connection {} answered the handshake with {}, probing again",
                connection.id(),
                reply.message_type()
            );
            tokio::time::sleep(REPROBE_DELAY).await;
            continue;
        }

        let name = reply.data().unwrap_or_default();

        // Nothing else may reach the worker between insert and REGISTERED.
        let mut outbound = connection.outbound().await;
        match registry.try_register(name, connection) {
            Ok(guard) => {
                outbound.send(&Message::new(MessageType::Registered)).await?;
                return Ok(guard);
            }
            Err(e) => {
                drop(outbound);
                warn!("Connection {}: {e}, probing again", connection.id());
                metrics.handshake_rejected();
                tokio::time::sleep(REPROBE_DELAY).await;
            }
        }
    }
}
