use crate::{BrokerError, Connection, Metrics, MetricsTimer, ShutdownGuard, WorkerRegistry};

use herald_config::DispatchConfig;
use herald_core::{Message, MessageType};
use herald_store::PriorityBuffer;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

/// Result of one broadcast round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// No registered workers or nothing pending.
    Idle,
    /// Every worker confirmed; the message was retired.
    Delivered { message_id: String, workers: usize },
    /// At least one worker failed; the message stays at the head.
    Retained { message_id: String, failed: usize },
    /// At least one worker did not reply within the round timeout.
    TimedOut { message_id: String, pending: usize },
}

/// Result of delivering one message to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// `RESPONSE` echoing the delivered id.
    Confirmed,
    /// The worker sent `DEREGISTER` and was removed.
    Departed,
    /// `RESPONSE` carrying some other id. The worker stays registered.
    Rejected,
    /// Connection fault or protocol violation. The worker was removed.
    Faulted,
    /// No reply within the round timeout. The worker stays registered.
    TimedOut,
}

impl DeliveryOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Confirmed | Self::Departed)
    }
}

/// Broadcasts the buffer head to every registered worker and retires it once
/// all of them confirm.
pub struct BroadcastDispatcher {
    buffer: Arc<PriorityBuffer>,
    registry: WorkerRegistry,
    metrics: Metrics,
    round_timeout: Duration,
    in_flight: Arc<Semaphore>,
}

impl BroadcastDispatcher {
    pub fn new(
        buffer: Arc<PriorityBuffer>,
        registry: WorkerRegistry,
        metrics: Metrics,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            buffer,
            registry,
            metrics,
            round_timeout: config.round_timeout(),
            in_flight: Arc::new(Semaphore::new(config.effective_max_in_flight())),
        }
    }

    pub fn round_timeout(&self) -> Duration {
        self.round_timeout
    }

    /// Run one round against a snapshot of the registry.
    ///
    /// The head is peeked, not popped: it is retired by id only after every
    /// delivery succeeded, so a failed or timed-out round leaves it in place
    /// for the next one. Each worker's timeout starts once its delivery holds
    /// an in-flight permit, so queueing for a permit never counts against it.
    pub async fn run_round(&self) -> RoundOutcome {
        let workers = self.registry.snapshot();
        if workers.is_empty() {
            return RoundOutcome::Idle;
        }
        let Some(message) = self.buffer.peek() else {
            return RoundOutcome::Idle;
        };

        let timer = MetricsTimer::new(self.metrics.clone());
        let message = Arc::new(message);
        let message_id = message.id().to_string();
        let worker_count = workers.len();

        debug!("Broadcasting {message} to {worker_count} worker(s)");

        let mut deliveries = JoinSet::new();
        for (name, connection) in workers {
            let message = Arc::clone(&message);
            let registry = self.registry.clone();
            let metrics = self.metrics.clone();
            let permits = Arc::clone(&self.in_flight);
            let round_timeout = self.round_timeout;

            deliveries.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let delivery = deliver(&name, &connection, &message, &registry, &metrics);
                match timeout(round_timeout, delivery).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(
                            "Worker '{name}' did not confirm {} within {round_timeout:?}",
                            message.id()
                        );
                        DeliveryOutcome::TimedOut
                    }
                }
            });
        }

        let mut failed = 0;
        let mut pending = 0;
        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok(DeliveryOutcome::TimedOut) => pending += 1,
                Ok(outcome) if !outcome.is_success() => failed += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!("Delivery task for {message_id} did not finish: {e}");
                    failed += 1;
                }
            }
        }

        timer.finish();

        if pending > 0 {
            warn!("Round for {message_id} timed out with {pending} worker(s) outstanding");
            self.metrics.round_completed("timed_out", worker_count);
            return RoundOutcome::TimedOut {
                message_id,
                pending,
            };
        }

        if failed > 0 {
            info!("Message {message_id} retained, {failed} of {worker_count} deliveries failed");
            self.metrics.round_completed("retained", worker_count);
            return RoundOutcome::Retained { message_id, failed };
        }

        if self.buffer.retire(&message_id).is_none() {
            warn!("Message {message_id} was no longer buffered when retired");
        }
        self.metrics.buffer_depth(self.buffer.len());
        self.metrics.round_completed("delivered", worker_count);
        info!("Message {message_id} delivered to {worker_count} worker(s)");

        RoundOutcome::Delivered {
            message_id,
            workers: worker_count,
        }
    }

    /// Run rounds until shutdown. An idle dispatcher sleeps until a message
    /// is pushed or registry membership changes.
    pub async fn run(&self, mut shutdown: ShutdownGuard) {
        info!(
            "Dispatcher started (round timeout {:?})",
            self.round_timeout
        );

        while !shutdown.is_triggered() {
            let outcome = tokio::select! {
                outcome = self.run_round() => outcome,
                _ = shutdown.wait() => break,
            };

            if outcome == RoundOutcome::Idle {
                tokio::select! {
                    _ = self.buffer.changed() => {}
                    _ = self.registry.changed() => {}
                    _ = shutdown.wait() => break,
                }
            }
        }

        info!("Dispatcher stopped");
    }
}

/// Send `message` to one worker and classify its reply.
pub async fn deliver(
    name: &str,
    connection: &Connection,
    message: &Message,
    registry: &WorkerRegistry,
    metrics: &Metrics,
) -> DeliveryOutcome {
    let stale = connection.discard_pending();
    if stale > 0 {
        debug!("Worker '{name}': dropped {stale} stale message(s) before delivery");
    }

    // Checked after the discard: a DEREGISTER dropped above is still seen.
    if connection.has_deregistered() {
        depart(name, connection, registry, metrics);
        return DeliveryOutcome::Departed;
    }

    if let Err(e) = connection.send(message).await {
        return fault(name, connection, registry, metrics, e);
    }

    let reply = match connection.receive().await {
        Ok(reply) => reply,
        Err(e) => return fault(name, connection, registry, metrics, e),
    };

    match reply.message_type() {
        MessageType::Response if reply.data() == Some(message.id()) => {
            debug!("Worker '{name}' confirmed {}", message.id());
            DeliveryOutcome::Confirmed
        }
        MessageType::Response => {
            warn!(
                "Worker '{name}' confirmed {:?} while {} was expected",
                reply.data(),
                message.id()
            );
            DeliveryOutcome::Rejected
        }
        MessageType::Deregister => {
            depart(name, connection, registry, metrics);
            DeliveryOutcome::Departed
        }
        other => fault(
            name,
            connection,
            registry,
            metrics,
            BrokerError::unexpected("RESPONSE", other),
        ),
    }
}

fn depart(name: &str, connection: &Connection, registry: &WorkerRegistry, metrics: &Metrics) {
    info!("Worker '{name}' deregistered");
    if registry.release(name, connection.id()) {
        metrics.worker_removed("deregistered");
    }
}

fn fault(
    name: &str,
    connection: &Connection,
    registry: &WorkerRegistry,
    metrics: &Metrics,
    error: BrokerError,
) -> DeliveryOutcome {
    // The handler may close a departing worker's connection mid-delivery.
    if connection.has_deregistered() {
        depart(name, connection, registry, metrics);
        return DeliveryOutcome::Departed;
    }

    warn!("Delivery to worker '{name}' failed: {error}");
    if registry.release(name, connection.id()) {
        metrics.worker_removed(error.error_code());
    }
    connection.close();
    DeliveryOutcome::Faulted
}
