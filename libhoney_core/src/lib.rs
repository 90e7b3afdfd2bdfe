/*!
 * libhoney core: the transmission engine of the libhoney SDK.
 *
 * Application threads hand events to a `TransmissionClient`; a lazily
 * started pool of worker threads batches them, POSTs them to the
 * Honeycomb API, and reports one `Response` per request on a bounded
 * queue owned by the caller.
 *
 * # Quick start
 *
 * ```ignore
 * use libhoney_core::{Event, ResponseQueue, TransmissionClient, TransmissionConfig};
 *
 * let responses = ResponseQueue::new(1000);
 * let client = TransmissionClient::with_http(TransmissionConfig::default(), responses.clone())?;
 *
 * client.add(Event::new("WRITEKEY", "my-dataset", "https://api.honeycomb.io", data));
 *
 * client.close(true)?;
 * for response in responses.iter() {
 *     println!("{:?} in {:?}", response.status_code, response.duration);
 * }
 * ```
 *
 * # Module structure
 *
 * - `protocol/`: what we send: event and response types, header names, routes
 * - `transport/`: how we deliver: queues, request building, HTTP, worker loop
 * - `transmission`: worker pool start and shutdown coordination
 * - `config`: `TransmissionConfig` and `SendMode`
 * - `guard`: RAII close-on-drop
 * - `error`: error enums
 */

mod config;
mod error;
mod guard;
mod protocol;
mod transmission;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use config::{SendMode, TransmissionConfig};
pub use error::{ConfigError, Result, SendError, TransmissionError};
pub use guard::CloseGuard;
pub use protocol::constants::USER_AGENT;
pub use protocol::types::{Batch, BatchRecord, Event, Response};
pub use transmission::TransmissionClient;
pub use transport::{BoundedQueue, HttpTransport, OutboundRequest, ResponseQueue, Slot, Transport};
