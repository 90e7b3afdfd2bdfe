/**
 * Worker thread that drains the event queue and sends requests to the
 * Honeycomb collector.
 *
 * Architecture overview:
 *
 * ```text
 *  ┌──────────────┐   BoundedQueue<Event>   ┌─────────────────┐
 *  │  add() from  │ ───── Slot<Event> ────► │  Worker 0..N    │
 *  │  any thread  │                         │  (pool threads) │
 *  └──────────────┘                         └───────┬─────────┘
 *                                                   │ Transport::send()
 *                                            ┌──────▼──────┐
 *                                            │  Collector  │
 *                                            └──────┬──────┘
 *                                                   │ Response
 *                                           ┌───────▼────────┐
 *                                           │ ResponseQueue  │ ──► caller
 *                                           └────────────────┘
 * ```
 *
 * Each worker blocks for one event, then (in batch mode) keeps pulling
 * until the batch is full, the flush deadline passes, or a
 * `Slot::Shutdown` arrives. A shutdown marker is consumed by exactly one
 * worker, which sends what it holds and exits.
 */
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, warn};

use super::http::Transport;
use super::queue::{BoundedQueue, ResponseQueue, Slot};
use super::request::OutboundRequest;
use crate::config::{SendMode, TransmissionConfig};
use crate::error::SendError;
use crate::protocol::types::{Batch, Event, Response};

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// One pool thread's state. Moved into the thread by `spawn`.
pub struct Worker {
    id: usize,
    config: TransmissionConfig,
    events: BoundedQueue<Event>,
    responses: ResponseQueue,
    transport: Arc<dyn Transport>,
}

impl Worker {
    pub fn new(
        id: usize,
        config: TransmissionConfig,
        events: BoundedQueue<Event>,
        responses: ResponseQueue,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self { id, config, events, responses, transport }
    }

    /**
     * Starts the worker on a thread named `libhoney-worker-{id}`.
     *
     * The thread runs until it consumes a `Slot::Shutdown`.
     */
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("libhoney-worker-{}", self.id))
            .spawn(move || self.run())
    }

    /// The worker loop. Returns after consuming a shutdown marker.
    pub fn run(&self) {
        debug!(worker_id = self.id, mode = ?self.config.send_mode, "worker started");

        match self.config.send_mode {
            SendMode::Batch => self.run_batches(),
            SendMode::Single => self.run_single(),
        }

        debug!(worker_id = self.id, "worker stopped");
    }

    fn run_batches(&self) {
        loop {
            /*
             * Block for the first event instead of guessing from the queue
             * length whether more work is coming.
             */
            let first = match self.events.dequeue() {
                Slot::Item(event) => event,
                Slot::Shutdown => return,
            };

            let (batch, shutdown) = self.fill_batch(first);
            self.send_batch(batch);

            if shutdown {
                return;
            }
        }
    }

    /**
     * Grows a batch until it holds `max_batch_size` events, the
     * `send_frequency` deadline passes, or a shutdown marker shows up.
     *
     * # Returns
     * The batch, and whether a shutdown marker was consumed.
     */
    fn fill_batch(&self, first: Event) -> (Batch, bool) {
        let deadline = (!self.config.send_frequency.is_zero())
            .then(|| Instant::now() + self.config.send_frequency);
        let mut batch = Batch::new(first);

        while batch.len() < self.config.max_batch_size {
            let slot = match deadline {
                Some(deadline) => match self.events.dequeue_deadline(deadline) {
                    Some(slot) => slot,
                    None => break,
                },
                None => self.events.dequeue(),
            };

            match slot {
                Slot::Item(event) => batch.push(event),
                Slot::Shutdown => return (batch, true),
            }
        }

        (batch, false)
    }

    fn send_batch(&self, batch: Batch) {
        let count = batch.len();
        let request = OutboundRequest::batch(&batch);
        let response = self.transmit(request, batch.into_metadata());

        debug!(
            worker_id = self.id,
            events = count,
            status = ?response.status_code,
            duration_ms = response.duration.as_millis() as u64,
            "batch sent"
        );
        self.publish(response);
    }

    fn run_single(&self) {
        while let Slot::Item(event) = self.events.dequeue() {
            let request = OutboundRequest::single(&event);
            let response = self.transmit(request, event.metadata);
            self.publish(response);
        }
    }

    /**
     * Performs one request and wraps the outcome in a `Response`.
     *
     * Only the transport call is timed. Failures of any kind, including a
     * panic inside the transport, end up in `Response::error`.
     */
    fn transmit(&self, request: Result<OutboundRequest, SendError>, metadata: Value) -> Response {
        let request = match request {
            Ok(request) => request,
            Err(err) => {
                warn!(worker_id = self.id, error = %err, "could not build request");
                return Response {
                    duration: Duration::ZERO,
                    status_code: None,
                    metadata,
                    error: Some(err),
                };
            }
        };

        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.transport.send(&request)));
        let duration = started.elapsed();

        let (status_code, error) = match outcome {
            Ok(Ok(status)) => (Some(status), None),
            Ok(Err(err)) => {
                warn!(worker_id = self.id, url = %request.url, error = %err, "request failed");
                (None, Some(err))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(worker_id = self.id, url = %request.url, %message, "transport panicked");
                (None, Some(SendError::Panicked { message }))
            }
        };

        Response { duration, status_code, metadata, error }
    }

    /// Hands a response to the caller, dropping it if the queue is full and non-blocking.
    fn publish(&self, response: Response) {
        if !self.responses.enqueue(response, self.config.block_on_responses) {
            debug!(worker_id = self.id, "response queue full, dropping response");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records every request and answers with a fixed status.
    struct Recorder {
        status: u16,
        requests: Mutex<Vec<OutboundRequest>>,
    }

    impl Transport for Recorder {
        fn send(&self, request: &OutboundRequest) -> Result<u16, SendError> {
            self.requests.lock().push(request.clone());
            Ok(self.status)
        }
    }

    struct Panicking;

    impl Transport for Panicking {
        fn send(&self, _request: &OutboundRequest) -> Result<u16, SendError> {
            panic!("boom");
        }
    }

    fn event(n: u32) -> Event {
        Event::new("key", "ds", "http://collector", json!({ "n": n })).with_metadata(json!(n))
    }

    fn make_worker(
        config: TransmissionConfig,
        transport: Arc<dyn Transport>,
    ) -> (Worker, BoundedQueue<Event>, ResponseQueue) {
        let events = BoundedQueue::new(64);
        let responses = ResponseQueue::new(64);
        let worker = Worker::new(0, config, events.clone(), responses.clone(), transport);
        (worker, events, responses)
    }

    fn recorder() -> Arc<Recorder> {
        Arc::new(Recorder { status: 200, requests: Mutex::new(Vec::new()) })
    }

    #[test]
    fn test_batches_split_at_max_size() {
        let transport = recorder();
        let config = TransmissionConfig {
            max_batch_size: 2,
            send_frequency: Duration::ZERO,
            ..Default::default()
        };
        let (worker, events, responses) = make_worker(config, transport.clone());

        for n in 0..5 {
            events.enqueue(event(n), true);
        }
        events.push_shutdown();
        worker.run();

        let sizes: Vec<usize> = transport
            .requests
            .lock()
            .iter()
            .map(|r| serde_json::from_slice::<Vec<Value>>(&r.body).unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let metadata: Vec<Value> = (0..3)
            .map(|_| match responses.dequeue() {
                Slot::Item(response) => response.metadata,
                Slot::Shutdown => panic!("unexpected shutdown"),
            })
            .collect();
        assert_eq!(metadata, vec![json!(0), json!(2), json!(4)]);
    }

    /**
     * A partial batch is flushed once `send_frequency` elapses, without
     * waiting for a full batch or a shutdown marker.
     */
    #[test]
    fn test_partial_batch_flushed_after_send_frequency() {
        let transport = recorder();
        let config = TransmissionConfig {
            max_batch_size: 100,
            send_frequency: Duration::from_millis(20),
            ..Default::default()
        };
        let (worker, events, responses) = make_worker(config, transport.clone());
        let handle = worker.spawn().unwrap();

        events.enqueue(event(1), true);
        let response = match responses.dequeue() {
            Slot::Item(response) => response,
            Slot::Shutdown => panic!("unexpected shutdown"),
        };
        assert_eq!(response.status_code, Some(200));

        events.push_shutdown();
        handle.join().unwrap();
        assert_eq!(transport.requests.lock().len(), 1);
    }

    #[test]
    fn test_single_mode_one_response_per_event() {
        let transport = recorder();
        let config = TransmissionConfig { send_mode: SendMode::Single, ..Default::default() };
        let (worker, events, responses) = make_worker(config, transport.clone());

        events.enqueue(event(1), true);
        events.enqueue(event(2), true);
        events.push_shutdown();
        worker.run();

        let urls: Vec<String> = transport.requests.lock().iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, vec!["http://collector/1/events/ds", "http://collector/1/events/ds"]);
        assert_eq!(responses.len(), 2);
    }

    /**
     * A panicking transport produces an error response and the worker
     * keeps going until its shutdown marker.
     */
    #[test]
    fn test_transport_panic_becomes_error_response() {
        let config = TransmissionConfig { send_mode: SendMode::Single, ..Default::default() };
        let (worker, events, responses) = make_worker(config, Arc::new(Panicking));

        events.enqueue(event(1), true);
        events.enqueue(event(2), true);
        events.push_shutdown();
        worker.run();

        let errors: Vec<Option<SendError>> = (0..2)
            .map(|_| match responses.dequeue() {
                Slot::Item(response) => response.error,
                Slot::Shutdown => None,
            })
            .collect();
        assert_eq!(errors, vec![Some(SendError::Panicked { message: "boom".into() }); 2]);
    }

    #[test]
    fn test_full_response_queue_drops() {
        let transport = recorder();
        let config = TransmissionConfig { send_mode: SendMode::Single, ..Default::default() };
        let events = BoundedQueue::new(8);
        let responses = ResponseQueue::new(1);
        let worker = Worker::new(0, config, events.clone(), responses.clone(), transport.clone());

        for n in 0..3 {
            events.enqueue(event(n), true);
        }
        events.push_shutdown();
        worker.run();

        assert_eq!(transport.requests.lock().len(), 3);
        assert_eq!(responses.len(), 1);
    }
}
