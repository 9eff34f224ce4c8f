use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Metrics collector for the broker.
///
/// Records through the `metrics` facade; without an installed recorder
/// every call is a no-op.
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "herald" }
    }

    pub fn connection_accepted(&self) {
        counter!(format!("{}.connections.accepted", self.prefix)).increment(1);
        gauge!(format!("{}.connections.active", self.prefix)).increment(1.0);
    }

    /// Refused because `server.max_connections` was reached.
    pub fn connection_rejected(&self) {
        counter!(format!("{}.connections.rejected", self.prefix)).increment(1);
    }

    pub fn connection_closed(&self, reason: &str) {
        counter!(format!("{}.connections.closed", self.prefix)).increment(1);
        counter!(format!("{}.connections.closed.{}", self.prefix, reason)).increment(1);
        gauge!(format!("{}.connections.active", self.prefix)).decrement(1.0);
    }

    pub fn worker_registered(&self) {
        counter!(format!("{}.workers.registered", self.prefix)).increment(1);
    }

    pub fn worker_removed(&self, reason: &str) {
        counter!(format!("{}.workers.removed", self.prefix)).increment(1);
        counter!(format!("{}.workers.removed.{}", self.prefix, reason)).increment(1);
    }

    pub fn handshake_rejected(&self) {
        counter!(format!("{}.handshake.rejected", self.prefix)).increment(1);
    }

    pub fn messages_generated(&self, count: usize) {
        counter!(format!("{}.messages.generated", self.prefix)).increment(count as u64);
    }

    pub fn messages_spilled(&self, count: usize) {
        counter!(format!("{}.messages.spilled", self.prefix)).increment(count as u64);
    }

    pub fn messages_refilled(&self, count: usize) {
        counter!(format!("{}.messages.refilled", self.prefix)).increment(count as u64);
    }

    pub fn messages_dropped(&self, count: usize) {
        counter!(format!("{}.messages.dropped", self.prefix)).increment(count as u64);
    }

    pub fn buffer_depth(&self, depth: usize) {
        gauge!(format!("{}.buffer.depth", self.prefix)).set(depth as f64);
    }

    /// `outcome` is one of `delivered`, `retained`, `timed_out`.
    pub fn round_completed(&self, outcome: &str, workers: usize) {
        counter!(format!("{}.rounds.{}", self.prefix, outcome)).increment(1);
        gauge!(format!("{}.rounds.workers", self.prefix)).set(workers as f64);
    }

    pub fn round_latency(&self, duration: Duration) {
        histogram!(format!("{}.rounds.latency_ms", self.prefix))
            .record(duration.as_millis() as f64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
