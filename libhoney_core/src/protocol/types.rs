/**
 * Core type definitions for the transmission engine.
 *
 * `Event` is built by the host application and handed to
 * `TransmissionClient::add()`. `Response` is produced by a worker after
 * every transmission attempt and delivered through the caller's
 * `ResponseQueue`. `BatchRecord` is the per-event element of a batch body.
 */
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::SendError;

// ---------------------------------------------------------------------------
// Event: one telemetry record
// ---------------------------------------------------------------------------

/**
 * A fully populated telemetry event.
 *
 * The engine treats every field as opaque: routing fields are copied into
 * request URLs and headers, `data` is serialized, `metadata` is handed back
 * on the matching `Response`. Nothing is validated.
 *
 * Events are moved into the queue and never mutated afterwards.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Team write key, sent as `X-Honeycomb-Team`.
    pub writekey: String,

    /// Target dataset, the last path segment of the request URL.
    pub dataset: String,

    /// Base URL of the collector, e.g. `https://api.honeycomb.io`.
    pub api_host: String,

    /// Sample rate the host applied before enqueueing.
    pub sample_rate: u32,

    /// When the event happened.
    pub timestamp: DateTime<Utc>,

    /// Caller-owned value copied verbatim onto the `Response`.
    pub metadata: Value,

    /// The payload.
    pub data: Value,
}

impl Event {
    /**
     * Creates an event stamped with the current time, a sample rate of 1
     * and `null` metadata.
     */
    pub fn new(
        writekey: impl Into<String>,
        dataset: impl Into<String>,
        api_host: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            writekey: writekey.into(),
            dataset: dataset.into(),
            api_host: api_host.into(),
            sample_rate: 1,
            timestamp: Utc::now(),
            metadata: Value::Null,
            data,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// RFC 3339 rendering of `timestamp`, as sent on the wire.
    pub fn rfc3339_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

// ---------------------------------------------------------------------------
// Batch: events bound for one request
// ---------------------------------------------------------------------------

/**
 * Ordered, never-empty group of events sent as one batch request.
 *
 * Routing (write key, dataset, host) comes from the first event only; the
 * queue is expected to carry events for a single destination.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    events: Vec<Event>,
}

impl Batch {
    pub fn new(first: Event) -> Self {
        Self { events: vec![first] }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// The event whose routing and metadata represent the batch.
    pub fn first(&self) -> &Event {
        &self.events[0]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Gives the first event's metadata to the caller, dropping the batch.
    pub fn into_metadata(self) -> Value {
        self.events.into_iter().next().map(|e| e.metadata).unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// BatchRecord: one element of a batch request body
// ---------------------------------------------------------------------------

/**
 * Shape expected by the batch endpoint for each event:
 * ```json
 * { "time": "2024-01-01T00:00:00Z", "data": { ... } }
 * ```
 */
#[derive(Debug, Serialize)]
pub struct BatchRecord<'a> {
    pub time: String,
    pub data: &'a Value,
}

impl<'a> From<&'a Event> for BatchRecord<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            time: event.rfc3339_timestamp(),
            data: &event.data,
        }
    }
}

// ---------------------------------------------------------------------------
// Response: the outcome of one transmission attempt
// ---------------------------------------------------------------------------

/**
 * Outcome of one request (a whole batch, or a single event).
 *
 * For batches, `metadata` comes from the first event of the batch.
 */
#[derive(Debug)]
pub struct Response {
    /// Wall-clock time spent inside the transport call.
    pub duration: Duration,

    /// HTTP status, `None` when the request never completed.
    pub status_code: Option<u16>,

    /// Copied from the originating event.
    pub metadata: Value,

    /// Why the request did not complete, if it didn't.
    pub error: Option<SendError>,
}

impl Response {
    /// `true` for a completed request with a 2xx status.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code.is_some_and(|code| (200..300).contains(&code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_batch_record_shape() {
        let event = Event::new("key", "ds", "https://api.honeycomb.io", json!({"a": 1}))
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());

        let body = serde_json::to_value(BatchRecord::from(&event)).unwrap();
        assert_eq!(body, json!({"time": "2024-03-01T12:30:00Z", "data": {"a": 1}}));
    }

    #[test]
    fn test_event_defaults() {
        let event = Event::new("key", "ds", "host", json!(null));
        assert_eq!(event.sample_rate, 1);
        assert_eq!(event.metadata, Value::Null);
    }

    #[test]
    fn test_response_success() {
        let mut response = Response {
            duration: Duration::from_millis(5),
            status_code: Some(202),
            metadata: Value::Null,
            error: None,
        };
        assert!(response.is_success());

        response.status_code = Some(400);
        assert!(!response.is_success());

        response.status_code = None;
        response.error = Some(SendError::Transport { message: "refused".into() });
        assert!(!response.is_success());
    }
}
