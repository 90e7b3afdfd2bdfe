/*!
 * HTTP transport layer for sending requests to the Honeycomb collector.
 *
 * Uses `ureq`, a pure-Rust blocking HTTP client with no async runtime.
 * Workers are dedicated OS threads, so blocking I/O is the natural fit.
 *
 * - **No status-as-error**: a 4xx/5xx is a completed request and becomes a
 *   `Response` with that status, not a `SendError`.
 * - **Single attempt**: no retries; the caller sees every outcome on the
 *   response queue and decides.
 */

use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use super::request::OutboundRequest;
use crate::error::SendError;

/**
 * Seam between the workers and the network.
 *
 * `send` performs one request and returns the HTTP status, or the reason
 * it never completed. Implementations must be callable from several worker
 * threads at once.
 */
pub trait Transport: Send + Sync {
    fn send(&self, request: &OutboundRequest) -> Result<u16, SendError>;
}

/**
 * `Transport` backed by a shared `ureq::Agent`.
 *
 * Connection pooling and keep-alive are handled by the agent. The engine
 * itself never bounds a request; the timeouts configured here do.
 */
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    /**
     * Creates a transport with the given timeouts. `None` means no limit
     * for that phase.
     */
    pub fn new(connect_timeout: Option<Duration>, global_timeout: Option<Duration>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_connect(connect_timeout)
            .timeout_global(global_timeout)
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }
}

impl Default for HttpTransport {
    /// 10 s connect, 30 s total per request.
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(10)), Some(Duration::from_secs(30)))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &OutboundRequest) -> Result<u16, SendError> {
        let mut builder = self.agent.post(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .send(&request.body[..])
            .map_err(|err| SendError::transport(err.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response
                .into_body()
                .read_to_string()
                .unwrap_or_else(|_| "<unreadable body>".into());
            debug!(status, body = %body, url = %request.url, "collector rejected request");
        }

        Ok(status)
    }
}
