//! Request metrics middleware.
//!
//! # Metrics
//! - `dispatcher_requests_total` (counter): requests by route, method, status
//! - `dispatcher_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Labels use the matched route pattern, never the raw path, to keep
//!   cardinality bounded; unmatched requests share one label value
//! - Uses the `metrics` facade so the embedding application decides the
//!   exporter

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};

use crate::middleware::{HandleFunc, Middleware};

pub fn record_metrics() -> Middleware {
    Arc::new(|next: HandleFunc| -> HandleFunc {
        Arc::new(move |ctx| {
            let start = Instant::now();
            next(ctx);
            let route = if ctx.matched_route.is_empty() {
                "unmatched".to_string()
            } else {
                ctx.matched_route.clone()
            };
            let method = ctx.method().to_string();
            let status = ctx.resp_status.to_string();
            counter!(
                "dispatcher_requests_total",
                "route" => route.clone(),
                "method" => method.clone(),
                "status" => status.clone()
            )
            .increment(1);
            histogram!(
                "dispatcher_request_duration_seconds",
                "route" => route,
                "method" => method,
                "status" => status
            )
            .record(start.elapsed().as_secs_f64());
        })
    })
}
