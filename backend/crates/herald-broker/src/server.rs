use crate::{
    BroadcastDispatcher, BrokerError, Connection, ConnectionHandler, Generator, Metrics,
    Result as BrokerResult, ShutdownCoordinator, WorkerRegistry,
};

use herald_config::Config;
use herald_store::{OverflowStore, PriorityBuffer};

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use error_location::ErrorLocation;
use log::{error, info, warn};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// Handles shared by every broker task.
#[derive(Clone)]
pub struct BrokerState {
    pub buffer: Arc<PriorityBuffer>,
    pub registry: WorkerRegistry,
    pub metrics: Metrics,
    pub shutdown: ShutdownCoordinator,
}

/// The assembled broker: listener, generator, and dispatcher.
pub struct BrokerServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: BrokerState,
    generator: Generator,
    dispatcher: BroadcastDispatcher,
    max_connections: usize,
    inbound_buffer_size: usize,
}

impl BrokerServer {
    /// Bind the listener and open the overflow store.
    pub async fn bind(config: &Config, shutdown: ShutdownCoordinator) -> BrokerResult<Self> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| BrokerError::Bind {
                addr: addr.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;
        let local_addr = listener.local_addr()?;

        let overflow_dir = config.overflow_dir()?;
        let overflow = OverflowStore::open(&overflow_dir).await?;
        info!("Overflow store at {}", overflow_dir.display());

        let state = BrokerState {
            buffer: Arc::new(PriorityBuffer::new(config.generator.buffer_capacity)),
            registry: WorkerRegistry::new(),
            metrics: Metrics::new(),
            shutdown,
        };

        let generator = Generator::new(
            Arc::clone(&state.buffer),
            overflow,
            state.metrics.clone(),
            &config.generator,
        );
        let dispatcher = BroadcastDispatcher::new(
            Arc::clone(&state.buffer),
            state.registry.clone(),
            state.metrics.clone(),
            &config.dispatch,
        );

        Ok(Self {
            listener,
            local_addr,
            state,
            generator,
            dispatcher,
            max_connections: config.server.max_connections,
            inbound_buffer_size: config.dispatch.inbound_buffer_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &BrokerState {
        &self.state
    }

    /// Run until shutdown.
    ///
    /// A listener failure stops accepting new workers but generation and
    /// dispatch continue until shutdown is requested; the failure is then
    /// returned.
    pub async fn serve(self) -> BrokerResult<()> {
        let Self {
            listener,
            local_addr,
            state,
            generator,
            dispatcher,
            max_connections,
            inbound_buffer_size,
        } = self;

        info!("Broker listening on {local_addr}");

        let generator_task = tokio::spawn(generator.run(state.shutdown.subscribe_guard()));
        let dispatcher_guard = state.shutdown.subscribe_guard();
        let dispatcher_task = tokio::spawn(async move { dispatcher.run(dispatcher_guard).await });

        let accepted = accept_loop(listener, &state, max_connections, inbound_buffer_size).await;
        if let Err(e) = &accepted {
            error!("{e}; no new workers will be accepted");
            state.shutdown.subscribe_guard().wait().await;
        }

        if let Err(e) = generator_task.await {
            warn!("Generator task ended abnormally: {e}");
        }
        if let Err(e) = dispatcher_task.await {
            warn!("Dispatcher task ended abnormally: {e}");
        }

        info!("Broker stopped");
        accepted
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: &BrokerState,
    max_connections: usize,
    inbound_buffer_size: usize,
) -> BrokerResult<()> {
    let limit = Arc::new(Semaphore::new(max_connections));
    let mut shutdown = state.shutdown.subscribe_guard();

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted.map_err(|source| BrokerError::Listener {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?,
            _ = shutdown.wait() => return Ok(()),
        };

        let Ok(permit) = Arc::clone(&limit).try_acquire_owned() else {
            warn!("Connection limit of {max_connections} reached, refusing {peer}");
            state.metrics.connection_rejected();
            continue;
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not disable Nagle for {peer}: {e}");
        }

        let connection = Connection::spawn(stream, inbound_buffer_size);
        info!("Accepted {peer} as connection {}", connection.id());

        let handler = ConnectionHandler::new(
            connection,
            state.registry.clone(),
            state.metrics.clone(),
            state.shutdown.subscribe_guard(),
        );

        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = handler.handle().await {
                warn!("Connection from {peer} ended with error: {e}");
            }
        });
    }
}
