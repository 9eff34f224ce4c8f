mod cli;

use crate::WorkerClient;

use herald_broker::Connection;

use std::sync::Arc;
use std::time::Duration;

/// A client wired to an in-memory broker stand-in: (client, broker side).
pub(crate) fn client_pair(name: &str) -> (WorkerClient, Arc<Connection>) {
    let (broker, worker) = tokio::io::duplex(64 * 1024);
    let client = WorkerClient::from_connection(
        Connection::spawn(worker, 16),
        name,
        Duration::ZERO,
    );
    (client, Connection::spawn(broker, 16))
}
