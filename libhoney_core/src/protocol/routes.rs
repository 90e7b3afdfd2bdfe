/**
 * Endpoint routing.
 *
 * The API path is root-relative, so whatever path `api_host` carries is
 * replaced: `https://api.honeycomb.io/ignored/` and
 * `https://api.honeycomb.io` both route a batch for `dataset` to
 * `https://api.honeycomb.io/1/batch/dataset`.
 */
use super::constants::{BATCH_PATH, EVENTS_PATH};

/// URL of the batch endpoint for `dataset` on `api_host`.
pub fn batch_url(api_host: &str, dataset: &str) -> String {
    join(api_host, BATCH_PATH, dataset)
}

/// URL of the single-event endpoint for `dataset` on `api_host`.
pub fn event_url(api_host: &str, dataset: &str) -> String {
    join(api_host, EVENTS_PATH, dataset)
}

fn join(api_host: &str, prefix: &str, dataset: &str) -> String {
    format!("{}{prefix}{dataset}", origin(api_host))
}

/**
 * Strips any path, query or trailing slash from `api_host`, keeping
 * `scheme://authority`. Hosts without a scheme are kept up to the first `/`.
 */
fn origin(api_host: &str) -> &str {
    let authority_start = api_host.find("://").map_or(0, |idx| idx + 3);

    match api_host[authority_start..].find(['/', '?', '#']) {
        Some(idx) => &api_host[..authority_start + idx],
        None => api_host,
    }
}
