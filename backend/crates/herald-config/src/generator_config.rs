use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

// Production rate constraints
pub const MIN_MESSAGES_PER_TICK: usize = 1;
pub const MAX_MESSAGES_PER_TICK: usize = 10_000;
pub const DEFAULT_MESSAGES_PER_TICK: usize = 10;

// Tick period constraints (milliseconds)
pub const MIN_TICK_INTERVAL_MS: u64 = 10;
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

// In-memory buffer constraints
pub const MIN_BUFFER_CAPACITY: usize = 1;
pub const MAX_BUFFER_CAPACITY: usize = 1_000_000;
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Refill target as a multiple of the per-tick production rate
pub const DEFAULT_REFILL_FACTOR: usize = 10;

pub const DEFAULT_OVERFLOW_DIR: &str = "overflow";

/// Synthetic message production and overflow settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Messages produced on every tick
    pub messages_per_tick: usize,
    /// Tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Priority buffer capacity; excess messages spill to disk
    pub buffer_capacity: usize,
    /// Drain overflow back while the buffer holds fewer messages than this.
    /// Defaults to ten times `messages_per_tick`.
    pub refill_threshold: Option<usize>,
    /// Overflow directory, relative paths resolve against the config dir
    pub overflow_dir: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            messages_per_tick: DEFAULT_MESSAGES_PER_TICK,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            refill_threshold: None,
            overflow_dir: String::from(DEFAULT_OVERFLOW_DIR),
        }
    }
}

impl GeneratorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Refill target, never above the buffer capacity.
    pub fn effective_refill_threshold(&self) -> usize {
        self.refill_threshold
            .unwrap_or(self.messages_per_tick.saturating_mul(DEFAULT_REFILL_FACTOR))
            .min(self.buffer_capacity)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.messages_per_tick < MIN_MESSAGES_PER_TICK
            || self.messages_per_tick > MAX_MESSAGES_PER_TICK
        {
            return Err(ConfigError::generator(format!(
                "generator.messages_per_tick must be {}-{}, got {}",
                MIN_MESSAGES_PER_TICK, MAX_MESSAGES_PER_TICK, self.messages_per_tick
            )));
        }

        if self.tick_interval_ms < MIN_TICK_INTERVAL_MS
            || self.tick_interval_ms > MAX_TICK_INTERVAL_MS
        {
            return Err(ConfigError::generator(format!(
                "generator.tick_interval_ms must be {}-{}, got {}",
                MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS, self.tick_interval_ms
            )));
        }

        if self.buffer_capacity < MIN_BUFFER_CAPACITY
            || self.buffer_capacity > MAX_BUFFER_CAPACITY
        {
            return Err(ConfigError::generator(format!(
                "generator.buffer_capacity must be {}-{}, got {}",
                MIN_BUFFER_CAPACITY, MAX_BUFFER_CAPACITY, self.buffer_capacity
            )));
        }

        if let Some(threshold) = self.refill_threshold
            && (threshold == 0 || threshold > self.buffer_capacity)
        {
            return Err(ConfigError::generator(format!(
                "generator.refill_threshold must be 1-{} (buffer_capacity), got {}",
                self.buffer_capacity, threshold
            )));
        }

        if self.overflow_dir.trim().is_empty() || self.overflow_dir.contains("..") {
            return Err(ConfigError::generator(
                "generator.overflow_dir must be non-empty and cannot contain '..'",
            ));
        }

        Ok(())
    }
}
