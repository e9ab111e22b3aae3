//! Panic recovery middleware.
//!
//! # Responsibilities
//! - Scope a fault boundary around the rest of the chain
//! - Convert a panic into a configured staged response
//! - Log the panic payload with the matched route
//!
//! # Design Decisions
//! - The composition mechanism itself never catches faults; install this
//!   middleware outermost to keep a panicking handler from tearing down the
//!   request's connection task
//! - `catch_unwind` scopes the boundary to one request; the dispatcher and
//!   all other in-flight requests are unaffected

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::http::Context;
use crate::middleware::{HandleFunc, Middleware};

/// Builder for the recovery middleware: the staged status and body to serve
/// when a downstream stage panics.
pub struct Recovery {
    status: u16,
    body: Vec<u8>,
}

impl Recovery {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn build(self) -> Middleware {
        let Recovery { status, body } = self;
        Arc::new(move |next: HandleFunc| -> HandleFunc {
            let body = body.clone();
            Arc::new(move |ctx: &mut Context| {
                if let Err(panic) = catch_unwind(AssertUnwindSafe(|| next(ctx))) {
                    tracing::error!(
                        route = %ctx.matched_route,
                        path = %ctx.path(),
                        panic = %panic_message(&panic),
                        "handler panicked, serving recovery response"
                    );
                    ctx.resp_status = status;
                    ctx.resp_data = body.clone();
                }
            })
        })
    }
}

impl Default for Recovery {
    fn default() -> Self {
        Self::new(500, &b"Internal Server Error"[..])
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;
    use axum::http::Request;

    use super::*;
    use crate::http::BufferedSink;
    use crate::middleware::handle_fn;

    fn context() -> Context {
        let request = Request::builder().uri("/boom").body(Bytes::new()).unwrap();
        Context::new(request, Box::new(BufferedSink::shared()))
    }

    #[test]
    fn panic_becomes_the_configured_staged_response() {
        let middleware = Recovery::new(500, &b"recovered"[..]).build();
        let chain = middleware(handle_fn(|_ctx| panic!("kaboom")));

        let mut ctx = context();
        chain(&mut ctx);

        assert_eq!(ctx.resp_status, 500);
        assert_eq!(ctx.resp_data, b"recovered");
    }

    #[test]
    fn clean_requests_pass_through_untouched() {
        let middleware = Recovery::default().build();
        let chain = middleware(handle_fn(|ctx| {
            ctx.resp_status = 200;
            ctx.resp_data = b"ok".to_vec();
        }));

        let mut ctx = context();
        chain(&mut ctx);

        assert_eq!(ctx.resp_status, 200);
        assert_eq!(ctx.resp_data, b"ok");
    }
}
