/**
 * RAII guard returned by `TransmissionClient::guard()`.
 *
 * Dropping the guard calls `close(true)`: queued events are sent, workers
 * are joined and the response queue receives its final shutdown marker.
 *
 * ```ignore
 * fn main() {
 *     let client = TransmissionClient::with_http(config, responses)?;
 *     let _guard = client.guard();
 *
 *     // ... client.add(event) from anywhere ...
 *
 * }   // <-- _guard is dropped here, draining the queue
 * ```
 *
 * Close blocks until in-flight requests finish, so keep the guard in a
 * scope where blocking on exit is acceptable.
 */
use tracing::error;

use crate::transmission::TransmissionClient;

/// Close-on-drop guard for a `TransmissionClient`.
pub struct CloseGuard {
    client: TransmissionClient,
}

impl CloseGuard {
    pub(crate) fn new(client: TransmissionClient) -> Self {
        Self { client }
    }
}

impl Drop for CloseGuard {
    /// Failures are logged; a destructor has nobody to return them to.
    fn drop(&mut self) {
        if let Err(err) = self.client.close(true) {
            error!(error = %err, "close on drop failed");
        }
    }
}
