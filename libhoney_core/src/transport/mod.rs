/**
 * Transport layer: queues, HTTP delivery and the worker threads.
 *
 * Everything related to *how* events reach the collector:
 * - `queue`: bounded MPMC queue with an in-band shutdown marker
 * - `request`: building batch and single-event requests
 * - `http`: the `Transport` seam and its `ureq` implementation
 * - `worker`: the per-thread batch / single-event send loop
 */

pub mod http;
pub mod queue;
pub mod request;
pub mod worker;

pub use http::{HttpTransport, Transport};
pub use queue::{BoundedQueue, ResponseQueue, Slot};
pub use request::OutboundRequest;
pub use worker::Worker;
