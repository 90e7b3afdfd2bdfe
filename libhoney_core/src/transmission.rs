/**
 * The transmission client. Owns the event queue and the worker pool, and
 * coordinates shutdown.
 *
 * Lifecycle:
 * 1. `TransmissionClient::new()` validates the config and creates the
 *    event queue. No thread is started yet.
 * 2. The first `add()` starts `max_concurrent_batches` workers. While any
 *    of them is alive, later `add()` calls only enqueue.
 * 3. `close(drain)` stops every worker with one shutdown marker each,
 *    joins them, and pushes a final marker onto the response queue.
 * 4. An `add()` after `close()` starts a fresh pool. So does `close()`
 *    itself when an `add()` raced with it.
 *
 * The client is a cheap handle (`Clone`) around shared state, so it can be
 * handed to any number of producer threads.
 */
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::config::TransmissionConfig;
use crate::error::{Result, TransmissionError};
use crate::guard::CloseGuard;
use crate::protocol::types::Event;
use crate::transport::{BoundedQueue, HttpTransport, ResponseQueue, Transport, Worker};

/// How long `add` waits on the pool lock before looking at `closing` again.
const POOL_LOCK_POLL: Duration = Duration::from_millis(1);

type Pool = Vec<JoinHandle<()>>;

#[derive(Clone)]
pub struct TransmissionClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: TransmissionConfig,

    /// Events waiting for a worker.
    events: BoundedQueue<Event>,

    /// Caller-owned; workers publish here, `close()` terminates it.
    responses: ResponseQueue,

    transport: Arc<dyn Transport>,

    /// Join handles of the current pool. The lock serializes pool start
    /// against the teardown part of `close()`.
    workers: Mutex<Pool>,

    /// Set while `close()` holds the pool lock.
    closing: AtomicBool,

    /// `add()` calls between their pool check and the end of their enqueue.
    adds_in_progress: AtomicUsize,
}

impl TransmissionClient {
    /**
     * Creates a client sending through `transport` and reporting outcomes
     * on `responses`.
     *
     * # Returns
     * `Err(TransmissionError::Config)` if `config` fails validation.
     */
    pub fn new(
        config: TransmissionConfig,
        responses: ResponseQueue,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        let events = BoundedQueue::new(config.pending_work_capacity);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                events,
                responses,
                transport,
                workers: Mutex::new(Vec::new()),
                closing: AtomicBool::new(false),
                adds_in_progress: AtomicUsize::new(0),
            }),
        })
    }

    /// `new` with a default `HttpTransport` (10 s connect, 30 s total).
    pub fn with_http(config: TransmissionConfig, responses: ResponseQueue) -> Result<Self> {
        Self::new(config, responses, Arc::new(HttpTransport::default()))
    }

    /**
     * Queues `event` for transmission and makes sure a worker pool is
     * running.
     *
     * Fire-and-forget: with `block_on_send` the call waits for queue space,
     * otherwise a full queue drops the event without telling the caller.
     * A `close()` running on another thread never holds this call up: the
     * pool check is skipped and `close()` starts a fresh pool afterwards
     * if the event is still waiting.
     */
    pub fn add(&self, event: Event) {
        self.inner.adds_in_progress.fetch_add(1, Ordering::SeqCst);

        /*
         * Start the pool before a possibly blocking enqueue: with no worker
         * running, a full (or zero-capacity) queue would never free up.
         */
        if let Some(mut workers) = self.lock_pool_unless_closing() {
            self.start_pool(&mut workers);
        }

        if !self.inner.events.enqueue(event, self.inner.config.block_on_send) {
            debug!(
                capacity = self.inner.events.capacity(),
                "event queue full, dropping event"
            );
        }

        self.inner.adds_in_progress.fetch_sub(1, Ordering::SeqCst);
    }

    /// Pool lock for `add`, or `None` once a `close()` is known to hold it.
    fn lock_pool_unless_closing(&self) -> Option<MutexGuard<'_, Pool>> {
        loop {
            if let Some(workers) = self.inner.workers.try_lock_for(POOL_LOCK_POLL) {
                return Some(workers);
            }
            if self.inner.closing.load(Ordering::SeqCst) {
                return None;
            }
        }
    }

    fn ensure_workers(&self) {
        let mut workers = self.inner.workers.lock();
        self.start_pool(&mut workers);
    }

    /**
     * Starts `max_concurrent_batches` workers unless one is still alive.
     *
     * Callers hold the pool lock, so concurrent producers start at most one
     * pool between them.
     */
    fn start_pool(&self, workers: &mut Pool) {
        if workers.iter().any(|handle| !handle.is_finished()) {
            return;
        }

        for (worker_id, handle) in workers.drain(..).enumerate() {
            if handle.join().is_err() {
                error!(worker_id, "worker thread died unexpectedly");
            }
        }

        spawn_pool(workers, self.inner.config.max_concurrent_batches, |worker_id| {
            Worker::new(
                worker_id,
                self.inner.config.clone(),
                self.inner.events.clone(),
                self.inner.responses.clone(),
                Arc::clone(&self.inner.transport),
            )
            .spawn()
        });
    }

    /**
     * Stops the worker pool.
     *
     * 1. Unless `drain`, discards every event still waiting in the queue.
     * 2. Pushes one shutdown marker per live worker (always blocking).
     * 3. Joins every worker; in-flight requests finish first.
     * 4. Clears the pool so a later `add()` restarts it.
     * 5. Pushes a shutdown marker onto the response queue.
     * 6. Starts a fresh pool if an `add()` raced with steps 1 to 4 and its
     *    event is still waiting.
     *
     * Blocks for as long as the slowest in-flight request, and on the
     * response queue if the caller is not draining it. Concurrent `add()`
     * calls are not blocked by either.
     *
     * # Returns
     * `Err(TransmissionError::WorkerPanicked)` for the first worker that
     * could not be joined cleanly. Shutdown still completes.
     */
    pub fn close(&self, drain: bool) -> Result<()> {
        let (stopped, result) = {
            let mut workers = self.inner.workers.lock();
            self.inner.closing.store(true, Ordering::SeqCst);
            let outcome = self.stop_pool(&mut workers, drain);
            self.inner.closing.store(false, Ordering::SeqCst);
            outcome
        };

        self.inner.responses.push_shutdown();
        info!(drain, workers = stopped, "transmission closed");

        /* An add() that skipped its pool check above may have left work behind. */
        let racing_adds = self.inner.adds_in_progress.load(Ordering::SeqCst);
        if racing_adds > 0 || !self.inner.events.is_empty() {
            debug!("events arrived during close, restarting worker pool");
            self.ensure_workers();
        }

        result
    }

    fn stop_pool(&self, workers: &mut Pool, drain: bool) -> (usize, Result<()>) {
        if !drain {
            let discarded = self.inner.events.clear();
            if discarded > 0 {
                info!(discarded, "discarded queued events on close");
            }
        }

        /* A dead worker would leave its marker behind for the next pool. */
        let alive = workers.iter().filter(|handle| !handle.is_finished()).count();
        for _ in 0..alive {
            self.inner.events.push_shutdown();
        }

        let mut result = Ok(());
        let stopped = workers.len();
        for (worker_id, handle) in workers.drain(..).enumerate() {
            if handle.join().is_err() {
                error!(worker_id, "worker thread panicked");
                if result.is_ok() {
                    result = Err(TransmissionError::WorkerPanicked { worker_id });
                }
            }
        }

        (stopped, result)
    }

    /// RAII handle calling `close(true)` when dropped.
    pub fn guard(&self) -> CloseGuard {
        CloseGuard::new(self.clone())
    }

    /// Events queued but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.inner.events.len()
    }

    /// Workers of the current pool that have not exited.
    pub fn active_workers(&self) -> usize {
        self.inner
            .workers
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn config(&self) -> &TransmissionConfig {
        &self.inner.config
    }
}

/**
 * Spawns `count` workers into `workers`. A worker that fails to start is
 * logged and skipped; the next pool check tries again once the survivors
 * have exited.
 */
fn spawn_pool<F>(workers: &mut Pool, count: usize, mut spawn: F)
where
    F: FnMut(usize) -> io::Result<JoinHandle<()>>,
{
    for worker_id in 0..count {
        match spawn(worker_id) {
            Ok(handle) => workers.push(handle),
            Err(err) => error!(worker_id, error = %err, "failed to spawn worker thread"),
        }
    }

    if workers.is_empty() {
        error!(requested = count, "no worker thread could be started");
    } else {
        info!(workers = workers.len(), requested = count, "worker pool started");
    }
}
