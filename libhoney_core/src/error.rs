/**
 * Error types for the transmission engine.
 *
 * Nothing here is ever returned from `add()`: per-request failures travel
 * inside `Response::error`, and only configuration and shutdown problems
 * reach the caller directly.
 */
use thiserror::Error;

/// Result type alias for transmission operations.
pub type Result<T> = std::result::Result<T, TransmissionError>;

/// Rejected `TransmissionConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A batch must hold at least one event.
    #[error("max_batch_size must be at least 1")]
    ZeroBatchSize,

    /// The pool must be allowed at least one worker.
    #[error("max_concurrent_batches must be at least 1")]
    ZeroConcurrency,
}

/**
 * Why a single request did not complete. Carried on `Response::error`.
 */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// Connection, DNS, TLS or timeout failure below HTTP.
    #[error("transport failed: {message}")]
    Transport {
        /// Error reported by the HTTP client
        message: String,
    },

    /// The request body could not be serialized.
    #[error("failed to serialize request body: {message}")]
    Serialization {
        /// Error reported by the serializer
        message: String,
    },

    /// The transport panicked mid-request; the worker survived.
    #[error("transport panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string
        message: String,
    },
}

impl SendError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }
}

/**
 * Failures surfaced by `TransmissionClient` itself.
 */
#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker thread died outside the guarded send and could not be joined cleanly.
    #[error("worker {worker_id} panicked")]
    WorkerPanicked {
        /// Index of the worker within its pool
        worker_id: usize,
    },
}
