//! Access logging middleware.
//!
//! Emits one structured event per request after the inner chain returns:
//! method, path, matched route pattern, staged status and wall-clock
//! duration. The pattern (not the concrete path) is what instrumentation
//! should aggregate on.

use std::sync::Arc;
use std::time::Instant;

use crate::middleware::{HandleFunc, Middleware};

pub fn access_log() -> Middleware {
    Arc::new(|next: HandleFunc| -> HandleFunc {
        Arc::new(move |ctx| {
            let start = Instant::now();
            next(ctx);
            let route = if ctx.matched_route.is_empty() {
                "unmatched"
            } else {
                ctx.matched_route.as_str()
            };
            tracing::info!(
                method = %ctx.method(),
                path = %ctx.path(),
                route = %route,
                status = ctx.resp_status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "request served"
            );
        })
    })
}
