pub mod connection;
pub mod connection_handler;
pub mod connection_id;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod generator;
pub mod metrics;
pub mod metrics_timer;
pub mod registry;
pub mod server;
pub mod shutdown_coordinator;
pub mod shutdown_guard;

#[cfg(test)]
mod tests;

pub use connection::{Connection, ConnectionState, Outbound};
pub use connection_handler::{ConnectionHandler, REPROBE_DELAY};
pub use connection_id::ConnectionId;
pub use dispatcher::{BroadcastDispatcher, DeliveryOutcome, RoundOutcome, deliver};
pub use error::{BrokerError, Result};
pub use frame::{read_frame, write_frame};
pub use generator::{Generator, TickReport};
pub use metrics::Metrics;
pub use metrics_timer::MetricsTimer;
pub use registry::{RegistrationGuard, WorkerRegistry};
pub use server::{BrokerServer, BrokerState};
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
