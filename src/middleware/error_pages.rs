//! Error page mapping middleware.
//!
//! Replaces the staged body for configured status codes after the rest of the
//! chain has run, so a bare 404/500 can be turned into a branded page. Runs
//! inside the flush stage, which means the rewritten body is what reaches the
//! network.

use std::collections::HashMap;
use std::sync::Arc;

use crate::http::Context;
use crate::middleware::{HandleFunc, Middleware};

/// Builder mapping staged status codes to replacement bodies.
#[derive(Default)]
pub struct ErrorPages {
    pages: HashMap<u16, Vec<u8>>,
}

impl ErrorPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a replacement body for `status`. Last registration wins.
    pub fn page(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.pages.insert(status, body.into());
        self
    }

    pub fn build(self) -> Middleware {
        let pages = Arc::new(self.pages);
        Arc::new(move |next: HandleFunc| -> HandleFunc {
            let pages = Arc::clone(&pages);
            Arc::new(move |ctx: &mut Context| {
                next(ctx);
                if let Some(body) = pages.get(&ctx.resp_status) {
                    ctx.resp_data = body.clone();
                }
            })
        })
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
        let request = Request::builder().uri("/x").body(Bytes::new()).unwrap();
        Context::new(request, Box::new(BufferedSink::shared()))
    }

    #[test]
    fn mapped_status_gets_its_page() {
        let middleware = ErrorPages::new()
            .page(404, &b"<h1>nothing here</h1>"[..])
            .build();
        let chain = middleware(handle_fn(|ctx| {
            ctx.resp_status = 404;
            ctx.resp_data = b"Not Found".to_vec();
        }));

        let mut ctx = context();
        chain(&mut ctx);

        assert_eq!(ctx.resp_data, b"<h1>nothing here</h1>");
        assert_eq!(ctx.resp_status, 404);
    }

    #[test]
    fn unmapped_status_is_left_alone() {
        let middleware = ErrorPages::new().page(404, &b"page"[..]).build();
        let chain = middleware(handle_fn(|ctx| {
            ctx.resp_status = 200;
            ctx.resp_data = b"payload".to_vec();
        }));

        let mut ctx = context();
        chain(&mut ctx);

        assert_eq!(ctx.resp_data, b"payload");
    }
}
