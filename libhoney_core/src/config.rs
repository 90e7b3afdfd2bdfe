/**
 * Configuration for the transmission engine.
 *
 * All fields are public so hosts can fill them from their own settings
 * files (the struct is `Deserialize`; parsing is the host's business).
 * Defaults match the other libhoney SDKs.
 *
 * # Example
 * ```ignore
 * let config = TransmissionConfig {
 *     max_batch_size: 100,
 *     block_on_send: true,
 *     ..Default::default()
 * };
 * ```
 */
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// How workers turn queued events into requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    /// Up to `max_batch_size` events per `POST /1/batch/{dataset}`.
    #[default]
    Batch,

    /// One `POST /1/events/{dataset}` per event.
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    /// Upper bound on events per batch request.
    pub max_batch_size: usize,

    /// Longest a partial batch waits for more events before it is sent.
    /// `Duration::ZERO` turns the timer off: batches go out only when full
    /// or at shutdown.
    pub send_frequency: Duration,

    /// Number of workers, and therefore of requests in flight.
    pub max_concurrent_batches: usize,

    /// Capacity of the event queue. `0` makes it a rendezvous queue: an
    /// event is only accepted while a worker is waiting for one.
    pub pending_work_capacity: usize,

    /// Block `add()` when the event queue is full instead of dropping.
    pub block_on_send: bool,

    /// Block workers when the response queue is full instead of dropping.
    pub block_on_responses: bool,

    pub send_mode: SendMode,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            send_frequency: Duration::from_millis(100),
            max_concurrent_batches: 10,
            pending_work_capacity: 1000,
            block_on_send: false,
            block_on_responses: false,
            send_mode: SendMode::Batch,
        }
    }
}

impl TransmissionConfig {
    /// Rejects settings under which no event could ever be sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_concurrent_batches == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}
