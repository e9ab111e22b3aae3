//! Metric descriptions.
//!
//! The `metrics` facade records without an exporter until the embedding
//! application installs one; descriptions are registered here so any
//! exporter picks them up.

use metrics::{describe_counter, describe_histogram};

pub fn describe() {
    describe_counter!(
        "dispatcher_requests_total",
        "Total dispatched requests by route pattern, method and status"
    );
    describe_histogram!(
        "dispatcher_request_duration_seconds",
        "Request duration from chain entry to flush, in seconds"
    );
}
