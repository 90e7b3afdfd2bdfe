/**
 * Minimal harness for the libhoney transmission engine.
 *
 * Set a write key (and optionally dataset / host), then run:
 *
 *   HONEYCOMB_WRITEKEY=... cargo run -p libhoney_demo
 *   HONEYCOMB_WRITEKEY=... cargo run -p libhoney_demo -- --single   # one request per event
 *   HONEYCOMB_WRITEKEY=... cargo run -p libhoney_demo -- --discard  # close without draining
 *
 * `RUST_LOG=libhoney_core=debug` shows the worker pool at work.
 */
use std::env;

use libhoney_core::{Event, ResponseQueue, SendMode, TransmissionClient, TransmissionConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATASET: &str = "libhoney-rust-demo";
const DEFAULT_API_HOST: &str = "https://api.honeycomb.io";
const EVENT_COUNT: u64 = 20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let single = args.iter().any(|a| a == "--single");
    let discard = args.iter().any(|a| a == "--discard");

    let writekey = env::var("HONEYCOMB_WRITEKEY").unwrap_or_default();
    let dataset = env::var("HONEYCOMB_DATASET").unwrap_or_else(|_| DEFAULT_DATASET.into());
    let api_host = env::var("HONEYCOMB_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.into());

    let config = TransmissionConfig {
        max_batch_size: 5,
        max_concurrent_batches: 2,
        send_mode: if single { SendMode::Single } else { SendMode::Batch },
        ..Default::default()
    };

    /*
     * The response queue must hold every response plus the final marker,
     * because we only start reading it after close().
     */
    let responses = ResponseQueue::new(EVENT_COUNT as usize + 1);
    let client = TransmissionClient::with_http(config, responses.clone())?;

    for n in 0..EVENT_COUNT {
        let event = Event::new(&writekey, &dataset, &api_host, json!({ "n": n, "source": "demo" }))
            .with_metadata(json!({ "n": n }));
        client.add(event);
    }
    println!("[demo] Queued {EVENT_COUNT} events");

    client.close(!discard)?;

    for response in responses.iter() {
        match (&response.status_code, &response.error) {
            (Some(status), _) => println!(
                "[demo] {} -> HTTP {status} in {:?}",
                response.metadata, response.duration
            ),
            (None, Some(err)) => println!("[demo] {} -> failed: {err}", response.metadata),
            (None, None) => println!("[demo] {} -> no status", response.metadata),
        }
    }

    println!("[demo] Done.");
    Ok(())
}
