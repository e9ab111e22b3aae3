//! Request ID middleware.
//!
//! Assigns every request a correlation ID as early as possible: an incoming
//! `x-request-id` header is honored, otherwise a UUID v4 is generated. The ID
//! is published to downstream stages through the context's typed user-value
//! bag under [`REQUEST_ID`].

use std::sync::Arc;

use uuid::Uuid;

use crate::middleware::{HandleFunc, Middleware};

/// User-value key the request ID is stored under.
pub const REQUEST_ID: &str = "request-id";

pub fn request_id() -> Middleware {
    Arc::new(|next: HandleFunc| -> HandleFunc {
        Arc::new(move |ctx| {
            let id = ctx
                .header("x-request-id")
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            tracing::debug!(request_id = %id, path = %ctx.path(), "request accepted");
            ctx.set_value(REQUEST_ID, id);
            next(ctx);
        })
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;
    use axum::http::Request;

    use super::*;
    use crate::http::{BufferedSink, Context};
    use crate::middleware::handle_fn;

    #[test]
    fn incoming_header_is_honored() {
        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Bytes::new())
            .unwrap();
        let mut ctx = Context::new(request, Box::new(BufferedSink::shared()));

        let chain = request_id()(handle_fn(|ctx| {
            let id: &String = ctx.value(REQUEST_ID).unwrap();
            ctx.resp_data = id.clone().into_bytes();
        }));
        chain(&mut ctx);

        assert_eq!(ctx.resp_data, b"abc-123");
    }

    #[test]
    fn missing_header_gets_a_generated_id() {
        let request = Request::builder().uri("/").body(Bytes::new()).unwrap();
        let mut ctx = Context::new(request, Box::new(BufferedSink::shared()));

        request_id()(handle_fn(|_ctx| {}))(&mut ctx);

        let id: &String = ctx.value(REQUEST_ID).unwrap();
        assert_eq!(id.len(), 36);
    }
}
