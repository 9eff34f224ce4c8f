use crate::{Metrics, ShutdownGuard};

use herald_config::GeneratorConfig;
use herald_core::Message;
use herald_store::{OverflowStore, PriorityBuffer, StoreError};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::MissedTickBehavior;

/// What one generator tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub produced: usize,
    pub buffered: usize,
    pub spilled: usize,
    pub dropped: usize,
    pub refilled: usize,
}

/// Periodic producer of synthetic pushes.
///
/// Owns the overflow store: new messages that do not fit in the buffer are
/// spilled there, and spilled messages are moved back while the buffer is
/// below the refill threshold.
pub struct Generator {
    buffer: Arc<PriorityBuffer>,
    overflow: OverflowStore,
    metrics: Metrics,
    messages_per_tick: usize,
    refill_threshold: usize,
    tick_interval: Duration,
}

impl Generator {
    pub fn new(
        buffer: Arc<PriorityBuffer>,
        overflow: OverflowStore,
        metrics: Metrics,
        config: &GeneratorConfig,
    ) -> Self {
        Self {
            buffer,
            overflow,
            metrics,
            messages_per_tick: config.messages_per_tick,
            refill_threshold: config.effective_refill_threshold(),
            tick_interval: config.tick_interval(),
        }
    }

    /// A fresh `SERVER_PUSH` with a random priority.
    pub fn synthesize(&self) -> Message {
        Message::generate()
    }

    pub fn overflow(&self) -> &OverflowStore {
        &self.overflow
    }

    /// Refill from overflow, then produce this tick's messages.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            refilled: self.refill().await,
            ..TickReport::default()
        };

        for _ in 0..self.messages_per_tick {
            let message = self.synthesize();
            report.produced += 1;

            match self.buffer.push(message) {
                Ok(()) => report.buffered += 1,
                Err(StoreError::CapacityExceeded { message, .. }) => {
                    match self.overflow.spill(&message).await {
                        Ok(_) => report.spilled += 1,
                        Err(e) => {
                            warn!("Dropped message {}: {e}", message.id());
                            report.dropped += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Dropped generated message: {e}");
                    report.dropped += 1;
                }
            }
        }

        self.metrics.messages_generated(report.produced);
        self.metrics.messages_spilled(report.spilled);
        self.metrics.messages_refilled(report.refilled);
        self.metrics.messages_dropped(report.dropped);
        self.metrics.buffer_depth(self.buffer.len());

        report
    }

    /// Move overflow entries back while the buffer sits below the threshold.
    async fn refill(&mut self) -> usize {
        let mut refilled = 0;

        while self.buffer.len() < self.refill_threshold && self.buffer.has_capacity() {
            let Some(message) = self.overflow.drain().await else {
                break;
            };

            if let Err(e) = self.buffer.push(message) {
                // Lost the race for the last slot; put it back for next time.
                let Some(message) = e.into_message() else {
                    break;
                };
                if let Err(e) = self.overflow.spill(&message).await {
                    warn!("Dropped message {}: {e}", message.id());
                }
                break;
            }
            refilled += 1;
        }

        refilled
    }

    /// Tick on the configured period until shutdown.
    pub async fn run(mut self, mut shutdown: ShutdownGuard) {
        info!(
            "Generator started: {} message(s) every {:?}",
            self.messages_per_tick, self.tick_interval
        );

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = self.tick().await;
                    debug!(
                        "Tick: produced={} buffered={} spilled={} dropped={} refilled={} depth={}",
                        report.produced,
                        report.buffered,
                        report.spilled,
                        report.dropped,
                        report.refilled,
                        self.buffer.len()
                    );
                }
                _ = shutdown.wait() => break,
            }
        }

        info!("Generator stopped");
    }
}
