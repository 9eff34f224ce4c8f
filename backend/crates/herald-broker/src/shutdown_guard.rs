use crate::ShutdownCoordinator;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// Per-task view of a [`ShutdownCoordinator`].
///
/// Guards created after shutdown was requested still observe it, and
/// `wait()` may be awaited any number of times.
pub struct ShutdownGuard {
    shutdown_rx: broadcast::Receiver<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownGuard {
    pub fn new(coordinator: &ShutdownCoordinator) -> Self {
        Self {
            shutdown_rx: coordinator.subscribe(),
            triggered: coordinator.flag(),
        }
    }

    /// Wait for the shutdown signal.
    pub async fn wait(&mut self) {
        if self.is_triggered() {
            return;
        }
        let _ = self.shutdown_rx.recv().await;
    }

    /// Non-blocking check.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}
