use crate::{ConfigError, ConfigErrorResult};

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Round timeout constraints (milliseconds)
pub const MIN_ROUND_TIMEOUT_MS: u64 = 100;
pub const MAX_ROUND_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_ROUND_TIMEOUT_MS: u64 = 5000;

// Concurrent deliveries per round (0 = available parallelism)
pub const MAX_MAX_IN_FLIGHT: usize = 4096;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 0;

// Per-connection inbound queue constraints
pub const MIN_INBOUND_BUFFER_SIZE: usize = 1;
pub const MAX_INBOUND_BUFFER_SIZE: usize = 10_000;
pub const DEFAULT_INBOUND_BUFFER_SIZE: usize = 64;

/// Broadcast round settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound on collecting every confirmation of one round
    pub round_timeout_ms: u64,
    /// Deliveries running at once inside a round; 0 sizes to the machine
    pub max_in_flight: usize,
    /// Decoded frames queued per connection before the reader waits
    pub inbound_buffer_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            round_timeout_ms: DEFAULT_ROUND_TIMEOUT_MS,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            inbound_buffer_size: DEFAULT_INBOUND_BUFFER_SIZE,
        }
    }
}

impl DispatchConfig {
    pub fn round_timeout(&self) -> Duration {
        Duration::from_millis(self.round_timeout_ms)
    }

    pub fn effective_max_in_flight(&self) -> usize {
        if self.max_in_flight > 0 {
            return self.max_in_flight;
        }

        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.round_timeout_ms < MIN_ROUND_TIMEOUT_MS
            || self.round_timeout_ms > MAX_ROUND_TIMEOUT_MS
        {
            return Err(ConfigError::dispatch(format!(
                "dispatch.round_timeout_ms must be {}-{}, got {}",
                MIN_ROUND_TIMEOUT_MS, MAX_ROUND_TIMEOUT_MS, self.round_timeout_ms
            )));
        }

        if self.max_in_flight > MAX_MAX_IN_FLIGHT {
            return Err(ConfigError::dispatch(format!(
                "dispatch.max_in_flight must be 0 (auto) or at most {}, got {}",
                MAX_MAX_IN_FLIGHT, self.max_in_flight
            )));
        }

        if self.inbound_buffer_size < MIN_INBOUND_BUFFER_SIZE
            || self.inbound_buffer_size > MAX_INBOUND_BUFFER_SIZE
        {
            return Err(ConfigError::dispatch(format!(
                "dispatch.inbound_buffer_size must be {}-{}, got {}",
                MIN_INBOUND_BUFFER_SIZE, MAX_INBOUND_BUFFER_SIZE, self.inbound_buffer_size
            )));
        }

        Ok(())
    }
}
