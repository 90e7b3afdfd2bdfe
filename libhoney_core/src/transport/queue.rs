/**
 * Bounded multi-producer / multi-consumer queue with an in-band shutdown
 * marker.
 *
 * Used twice:
 * - the event queue between `add()` callers and the workers;
 * - the response queue between the workers and the caller.
 *
 * ```text
 *  producers ── enqueue(item, blocking) ──► [ Slot<T> ; capacity ] ──► dequeue() ── consumers
 *                                 push_shutdown() ─┘
 * ```
 *
 * Backed by a `crossbeam_channel::bounded` channel. Each handle keeps both
 * ends alive, so the channel never disconnects while any handle exists and
 * cloning a handle is cheap.
 *
 * A capacity of `0` yields a rendezvous queue: a blocking enqueue waits for
 * a consumer to take the item, a non-blocking enqueue only succeeds when a
 * consumer is already parked in `dequeue()`.
 */
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

// ---------------------------------------------------------------------------
// Slot: what travels through the queue
// ---------------------------------------------------------------------------

/// One queue element: a value, or the end-of-stream marker.
#[derive(Debug, PartialEq)]
pub enum Slot<T> {
    Item(T),

    /// No further items for the consumer that receives this.
    Shutdown,
}

// ---------------------------------------------------------------------------
// BoundedQueue
// ---------------------------------------------------------------------------

pub struct BoundedQueue<T> {
    sender: Sender<Slot<T>>,
    receiver: Receiver<Slot<T>>,
    capacity: usize,
}

/// Queue the caller owns and reads `Response`s from.
pub type ResponseQueue = BoundedQueue<crate::protocol::types::Response>;

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self { sender, receiver, capacity }
    }

    /**
     * Adds `item` to the back of the queue.
     *
     * With `blocking`, waits for free space. Without it, a full queue drops
     * the item on the floor.
     *
     * # Returns
     * `true` if the item was queued, `false` if it was dropped.
     */
    pub fn enqueue(&self, item: T, blocking: bool) -> bool {
        if blocking {
            return self.sender.send(Slot::Item(item)).is_ok();
        }

        match self.sender.try_send(Slot::Item(item)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /**
     * Appends an end-of-stream marker. Always blocks for space: a shutdown
     * signal is never dropped.
     */
    pub fn push_shutdown(&self) {
        /* Cannot fail: `self` holds a receiver, so the channel is connected. */
        let _ = self.sender.send(Slot::Shutdown);
    }

    /// Blocks until an item or a shutdown marker is available.
    pub fn dequeue(&self) -> Slot<T> {
        self.receiver.recv().unwrap_or(Slot::Shutdown)
    }

    /// Like `dequeue`, giving up with `None` once `deadline` has passed.
    pub fn dequeue_deadline(&self, deadline: Instant) -> Option<Slot<T>> {
        match self.receiver.recv_deadline(deadline) {
            Ok(slot) => Some(slot),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Slot::Shutdown),
        }
    }

    /// Non-blocking `dequeue`.
    pub fn try_dequeue(&self) -> Option<Slot<T>> {
        self.receiver.try_recv().ok()
    }

    /**
     * Consumes slots until the next shutdown marker, yielding the items.
     *
     * Handy on the response side:
     * ```ignore
     * for response in responses.iter() { ... }
     * ```
     */
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || match self.dequeue() {
            Slot::Item(item) => Some(item),
            Slot::Shutdown => None,
        })
    }

    /**
     * Discards everything currently buffered, markers included.
     *
     * Best effort under concurrency: slots pushed while clearing may
     * survive.
     *
     * # Returns
     * Number of items (not markers) discarded.
     */
    pub fn clear(&self) -> usize {
        let mut discarded = 0;
        while let Ok(slot) = self.receiver.try_recv() {
            if matches!(slot, Slot::Item(_)) {
                discarded += 1;
            }
        }
        discarded
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
