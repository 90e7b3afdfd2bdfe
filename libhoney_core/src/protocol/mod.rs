/*!
 * Protocol layer: wire types, constants and endpoint routing.
 *
 * Everything related to *what* we send to the Honeycomb API:
 * - `types`: Event, Response, BatchRecord
 * - `constants`: user agent, header names, API paths
 * - `routes`: building batch and single-event URLs from an event
 */

pub mod constants;
pub mod routes;
pub mod types;
