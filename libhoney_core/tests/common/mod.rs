//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use libhoney_core::{Event, OutboundRequest, SendError, Transport, TransmissionConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Event number `n` with `n` as both payload and metadata.
pub fn event(n: u64) -> Event {
    Event::new("writekey", "dataset", "http://collector.test", json!({ "n": n }))
        .with_metadata(json!(n))
}

/// Config with the flush timer off, so batches close only when full or at shutdown.
pub fn config(max_batch_size: usize, max_concurrent_batches: usize) -> TransmissionConfig {
    TransmissionConfig {
        max_batch_size,
        max_concurrent_batches,
        send_frequency: Duration::ZERO,
        pending_work_capacity: 1000,
        block_on_send: true,
        block_on_responses: true,
        ..Default::default()
    }
}

/**
 * Transport that records every request, answers with a fixed status and
 * tracks how many sends overlap.
 */
pub struct RecordingTransport {
    status: u16,
    requests: Mutex<Vec<OutboundRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl RecordingTransport {
    pub fn new(status: u16) -> Self {
        Self::with_delay(status, Duration::ZERO)
    }

    pub fn with_delay(status: u16, delay: Duration) -> Self {
        Self {
            status,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    /// The `n` payload field of every record, one inner vec per batch request.
    pub fn batches(&self) -> Vec<Vec<u64>> {
        self.requests()
            .iter()
            .map(|request| {
                let records: Vec<Value> = serde_json::from_slice(&request.body).unwrap();
                records.iter().map(|r| r["data"]["n"].as_u64().unwrap()).collect()
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &OutboundRequest) -> Result<u16, SendError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.requests.lock().push(request.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.status)
    }
}

/**
 * Transport that announces each send on `entered` and then waits for a
 * permit on `release`, so a test can hold a worker mid-request.
 */
pub struct GatedTransport {
    entered: Sender<()>,
    release: Receiver<()>,
    sent: AtomicUsize,
}

pub struct Gate {
    pub entered: Receiver<()>,
    pub release: Sender<()>,
}

impl GatedTransport {
    pub fn new() -> (Self, Gate) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        let transport = Self { entered: entered_tx, release: release_rx, sent: AtomicUsize::new(0) };
        (transport, Gate { entered: entered_rx, release: release_tx })
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl Transport for GatedTransport {
    fn send(&self, _request: &OutboundRequest) -> Result<u16, SendError> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(200)
    }
}

/// Transport whose every request fails below HTTP.
pub struct FailingTransport;

impl Transport for FailingTransport {
    fn send(&self, _request: &OutboundRequest) -> Result<u16, SendError> {
        Err(SendError::transport("connection refused"))
    }
}
