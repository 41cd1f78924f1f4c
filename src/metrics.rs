//! Load counters and timings via the `metrics` facade.
//!
//! Nothing is recorded unless the embedding application installs a recorder.

use metrics::{counter, histogram};
use std::time::Instant;

use crate::loader::RequestKind;

/// Count one finished request of `kind` with the given outcome label
/// (`loaded`, `error`, `timeout`, `parse-error`).
pub fn record_request(kind: RequestKind, outcome: &'static str) {
    counter!(
        "playlist_loader_requests_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record time from request start to now.
pub fn record_duration(kind: RequestKind, start: Instant) {
    histogram!(
        "playlist_loader_load_duration_seconds",
        "kind" => kind.as_str()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Count a request that replaced one still in flight.
pub fn record_abort(kind: RequestKind) {
    counter!("playlist_loader_aborted_total", "kind" => kind.as_str()).increment(1);
}
