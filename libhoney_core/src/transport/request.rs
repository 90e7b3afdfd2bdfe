/**
 * Outbound request assembly.
 *
 * Turns a `Batch` or a single `Event` into a transport-neutral
 * `OutboundRequest`: URL, headers, serialized JSON body. Building is pure,
 * so it is tested here without any network.
 */
use crate::error::SendError;
use crate::protocol::constants::{
    CONTENT_TYPE_JSON, HEADER_EVENT_TIME, HEADER_SAMPLE_RATE, HEADER_TEAM, USER_AGENT,
};
use crate::protocol::routes;
use crate::protocol::types::{Batch, BatchRecord, Event};

/// A fully built `POST` request.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl OutboundRequest {
    /**
     * `POST {api_host}/1/batch/{dataset}` with a JSON array of
     * `{time, data}` records, one per event, in batch order.
     *
     * Host, dataset and write key come from the first event.
     */
    pub fn batch(batch: &Batch) -> Result<Self, SendError> {
        let first = batch.first();
        let records: Vec<BatchRecord<'_>> = batch.events().iter().map(BatchRecord::from).collect();

        Ok(Self {
            url: routes::batch_url(&first.api_host, &first.dataset),
            headers: common_headers(first),
            body: to_json(&records)?,
        })
    }

    /**
     * `POST {api_host}/1/events/{dataset}` carrying the raw payload, with
     * sample rate and event time as headers.
     */
    pub fn single(event: &Event) -> Result<Self, SendError> {
        let mut headers = common_headers(event);
        headers.push((HEADER_SAMPLE_RATE, event.sample_rate.to_string()));
        headers.push((HEADER_EVENT_TIME, event.rfc3339_timestamp()));

        Ok(Self {
            url: routes::event_url(&event.api_host, &event.dataset),
            headers,
            body: to_json(&event.data)?,
        })
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn common_headers(event: &Event) -> Vec<(&'static str, String)> {
    vec![
        ("User-Agent", USER_AGENT.to_string()),
        ("Content-Type", CONTENT_TYPE_JSON.to_string()),
        (HEADER_TEAM, event.writekey.clone()),
    ]
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SendError> {
    serde_json::to_vec(value).map_err(|e| SendError::Serialization { message: e.to_string() })
}
