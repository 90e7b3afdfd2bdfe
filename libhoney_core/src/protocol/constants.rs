/**
 * SDK-wide constants.
 *
 * Header names and API paths understood by the Honeycomb collector.
 */

/// `User-Agent` sent with every request.
/// Derived at compile time from the `libhoney_core` package version.
pub const USER_AGENT: &str = concat!("libhoney-rust/", env!("CARGO_PKG_VERSION"));

/// Content type of every request body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Carries the write key of the (first) event.
pub const HEADER_TEAM: &str = "X-Honeycomb-Team";

/// Sample rate header, single-event requests only.
pub const HEADER_SAMPLE_RATE: &str = "X-Honeycomb-SampleRate";

/// Event timestamp header, single-event requests only.
pub const HEADER_EVENT_TIME: &str = "X-Event-Time";

/// Path prefix of the batch endpoint; the dataset name follows.
pub const BATCH_PATH: &str = "/1/batch/";

/// Path prefix of the single-event endpoint; the dataset name follows.
pub const EVENTS_PATH: &str = "/1/events/";
