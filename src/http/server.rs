//! Dispatcher setup and request handling.
//!
//! # Responsibilities
//! - Two-phase lifecycle: `ServerBuilder` is the mutation phase (routes,
//!   middleware, template engine), `build()` freezes everything into an
//!   immutable, cloneable `HttpServer`
//! - Compose user middleware + flush stage + route-serve terminal once
//! - Per request: build a fresh `Context`, run the chain, commit the staged
//!   response to the sink exactly once
//! - Expose the dispatcher through an axum catch-all router
//!
//! # Design Decisions
//! - The chain is composed at freeze time; serving reads shared state only,
//!   so concurrent requests need no synchronization
//! - The flush stage wraps the entire user chain: every middleware's
//!   post-logic can still restage the response before the single write
//! - Flush errors are logged and swallowed; the request is complete either
//!   way
//! - A panic in a handler is not caught here: it unwinds to the platform
//!   layer and kills that request's connection task only. Install the
//!   recovery middleware outermost to convert panics into responses.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;

use crate::http::context::Context;
use crate::http::sink::{BufferedSink, ResponseSink};
use crate::middleware::{compose, HandleFunc, Middleware};
use crate::routing::{RouteError, Router as PathRouter};
use crate::template::TemplateEngine;

/// Body served on a routing miss or a handler-less structural match.
const NOT_FOUND_BODY: &[u8] = b"Not Found";

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Mutation phase of the dispatcher lifecycle. Register routes and
/// middleware here; `build()` freezes the result for serving.
pub struct ServerBuilder {
    router: PathRouter<HandleFunc>,
    middlewares: Vec<Middleware>,
    template_engine: Option<Arc<dyn TemplateEngine>>,
    max_body_bytes: usize,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            router: PathRouter::new(),
            middlewares: Vec::new(),
            template_engine: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Registers a handler. Pattern and conflict violations are returned
    /// immediately so a broken route table can never start serving.
    pub fn route<H>(mut self, method: Method, path: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.router.register(method, path, Arc::new(handler))?;
        Ok(self)
    }

    pub fn get<H>(self, path: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H>(self, path: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn put<H>(self, path: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    pub fn delete<H>(self, path: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    /// Appends a middleware; earlier registrations run outermost.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.template_engine = Some(engine);
        self
    }

    /// Limit for buffering request bodies at the axum boundary.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Freezes the route table and composes the chain. After this point the
    /// dispatcher is read-only and safe for unsynchronized concurrent use.
    pub fn build(self) -> HttpServer {
        let router = Arc::new(self.router);
        let serve: HandleFunc = {
            let router = Arc::clone(&router);
            Arc::new(move |ctx: &mut Context| route_serve(&router, ctx))
        };
        let chain = flush_stage(compose(&self.middlewares, serve));
        HttpServer {
            inner: Arc::new(ServerInner {
                chain,
                template_engine: self.template_engine,
                max_body_bytes: self.max_body_bytes,
            }),
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct ServerInner {
    chain: HandleFunc,
    template_engine: Option<Arc<dyn TemplateEngine>>,
    max_body_bytes: usize,
}

/// Frozen dispatcher. Cheap to clone; all shared state is read-only.
#[derive(Clone)]
pub struct HttpServer {
    inner: Arc<ServerInner>,
}

impl HttpServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Dispatches one buffered request: builds a fresh context around the
    /// sink, runs the frozen chain once. The staged response has been
    /// committed to the sink by the time this returns.
    pub fn handle(&self, request: Request<Bytes>, sink: Box<dyn ResponseSink>) {
        let mut ctx = Context::new(request, sink);
        if let Some(engine) = &self.inner.template_engine {
            ctx.set_template_engine(Arc::clone(engine));
        }
        (self.inner.chain)(&mut ctx);
    }

    /// Wraps the dispatcher in an axum router: one catch-all route plus the
    /// root, every request funneled through [`dispatch`].
    pub fn into_router(self) -> axum::Router {
        axum::Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(self)
    }

    /// Runs the dispatcher on `listener` until a shutdown signal arrives.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "dispatcher listening");

        axum::serve(listener, self.into_router().into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("dispatcher stopped");
        Ok(())
    }
}

/// Route-serve terminal: one trie lookup per request. A miss or a
/// handler-less structural match stages a 404 and returns without invoking
/// anything.
fn route_serve(router: &PathRouter<HandleFunc>, ctx: &mut Context) {
    let method = ctx.method().clone();
    let path = ctx.path().to_string();

    let Some(matched) = router.find(&method, &path) else {
        tracing::debug!(method = %method, path = %path, "no route matched");
        stage_not_found(ctx);
        return;
    };
    let Some(handler) = matched.handler() else {
        tracing::debug!(method = %method, path = %path, "route node has no handler");
        stage_not_found(ctx);
        return;
    };

    let handler = Arc::clone(handler);
    ctx.matched_route = matched.route().to_string();
    ctx.path_params = matched.params;
    handler(ctx);
}

fn stage_not_found(ctx: &mut Context) {
    ctx.resp_status = 404;
    ctx.resp_data = NOT_FOUND_BODY.to_vec();
}

/// Wraps the whole chain so the staged response is committed exactly once,
/// after every stage's post-logic has run.
fn flush_stage(next: HandleFunc) -> HandleFunc {
    Arc::new(move |ctx: &mut Context| {
        next(ctx);
        flush_response(ctx);
    })
}

/// Commits the staged response. A zero status is left to the sink's
/// default. Errors and short writes are logged, never retried or escalated:
/// the request is complete regardless.
fn flush_response(ctx: &mut Context) {
    if ctx.resp_status != 0 {
        if let Err(error) = ctx.sink.write_status(ctx.resp_status) {
            tracing::error!(status = ctx.resp_status, %error, "failed to flush status");
        }
    }
    match ctx.sink.write_body(&ctx.resp_data) {
        Ok(written) if written == ctx.resp_data.len() => {}
        Ok(written) => tracing::error!(
            written,
            expected = ctx.resp_data.len(),
            "short write while flushing response"
        ),
        Err(error) => tracing::error!(%error, "failed to flush response"),
    }
}

/// Axum boundary: buffer the body, run the chain against a shared in-memory
/// sink, convert the sink contents into the HTTP response.
async fn dispatch(State(server): State<HttpServer>, request: Request<Body>) -> Response {
    let limit = server.inner.max_body_bytes;
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(%error, "failed to buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let staged = BufferedSink::shared();
    server.handle(
        Request::from_parts(parts, bytes),
        Box::new(Arc::clone(&staged)),
    );

    let sink = match staged.lock() {
        Ok(sink) => sink,
        Err(poisoned) => poisoned.into_inner(),
    };
    let status = sink
        .status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);
    match Response::builder()
        .status(status)
        .body(Body::from(sink.body().to_vec()))
    {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(%error, "failed to assemble response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::middleware::{ErrorPages, Recovery};

    fn get(uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn sink_pair() -> (Arc<Mutex<BufferedSink>>, Box<dyn ResponseSink>) {
        let shared = BufferedSink::shared();
        let writer = Box::new(Arc::clone(&shared));
        (shared, writer)
    }

    #[test]
    fn parameter_route_end_to_end() {
        let server = HttpServer::builder()
            .get("/greet/:name", |ctx: &mut Context| {
                let name = ctx.path_value("name").unwrap().to_string();
                ctx.resp_status = 200;
                ctx.resp_data = format!("hello {name}").into_bytes();
            })
            .unwrap()
            .build();

        let (shared, writer) = sink_pair();
        server.handle(get("/greet/Abel"), writer);

        let sink = shared.lock().unwrap();
        assert_eq!(sink.status(), Some(200));
        assert_eq!(sink.body(), b"hello Abel");
    }

    #[test]
    fn wildcard_route_matches_deep_paths() {
        let server = HttpServer::builder()
            .get("/files/*", |ctx: &mut Context| {
                ctx.resp_status = 200;
                ctx.resp_data = ctx.path().as_bytes().to_vec();
            })
            .unwrap()
            .build();

        let (shared, writer) = sink_pair();
        server.handle(get("/files/a/b/c"), writer);

        let sink = shared.lock().unwrap();
        assert_eq!(sink.status(), Some(200));
        assert_eq!(sink.body(), b"/files/a/b/c");
    }

    #[test]
    fn unmatched_request_is_a_staged_404() {
        let server = HttpServer::builder()
            .get("/known", |_ctx: &mut Context| {})
            .unwrap()
            .build();

        let (shared, writer) = sink_pair();
        server.handle(get("/does/not/exist"), writer);

        let sink = shared.lock().unwrap();
        assert_eq!(sink.status(), Some(404));
        assert_eq!(sink.body(), NOT_FOUND_BODY);
    }

    #[test]
    fn unset_status_leaves_the_sink_default() {
        let server = HttpServer::builder()
            .get("/body-only", |ctx: &mut Context| {
                ctx.resp_data = b"data".to_vec();
            })
            .unwrap()
            .build();

        let (shared, writer) = sink_pair();
        server.handle(get("/body-only"), writer);

        let sink = shared.lock().unwrap();
        assert_eq!(sink.status(), None);
        assert_eq!(sink.body(), b"data");
    }

    #[test]
    fn flush_runs_after_middleware_post_logic() {
        // error_pages rewrites the staged 404 after route-serve returned;
        // what reaches the sink must be the rewritten body.
        let server = HttpServer::builder()
            .middleware(ErrorPages::new().page(404, &b"custom page"[..]).build())
            .get("/known", |_ctx: &mut Context| {})
            .unwrap()
            .build();

        let (shared, writer) = sink_pair();
        server.handle(get("/missing"), writer);

        let sink = shared.lock().unwrap();
        assert_eq!(sink.status(), Some(404));
        assert_eq!(sink.body(), b"custom page");
    }

    #[test]
    fn recovery_middleware_converts_a_panic_and_flush_still_runs() {
        let server = HttpServer::builder()
            .middleware(Recovery::new(500, &b"recovered"[..]).build())
            .get("/boom", |_ctx: &mut Context| panic!("handler exploded"))
            .unwrap()
            .build();

        let (shared, writer) = sink_pair();
        server.handle(get("/boom"), writer);

        let sink = shared.lock().unwrap();
        assert_eq!(sink.status(), Some(500));
        assert_eq!(sink.body(), b"recovered");
    }

    struct FailingSink;

    impl ResponseSink for FailingSink {
        fn write_status(&mut self, _status: u16) -> io::Result<()> {
            Err(io::Error::other("connection reset"))
        }

        fn write_body(&mut self, _data: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("connection reset"))
        }
    }

    #[test]
    fn flush_errors_complete_the_request() {
        let served = Arc::new(Mutex::new(false));
        let server = {
            let served = Arc::clone(&served);
            HttpServer::builder()
                .get("/x", move |ctx: &mut Context| {
                    *served.lock().unwrap() = true;
                    ctx.resp_status = 200;
                    ctx.resp_data = b"payload".to_vec();
                })
                .unwrap()
                .build()
        };

        // Must not panic or unwind; the error is logged and swallowed.
        server.handle(get("/x"), Box::new(FailingSink));
        assert!(*served.lock().unwrap());
    }

    #[test]
    fn duplicate_route_aborts_the_builder() {
        let result = HttpServer::builder()
            .get("/a/b", |_ctx: &mut Context| {})
            .unwrap()
            .get("/a/b", |_ctx: &mut Context| {});
        assert!(matches!(result, Err(RouteError::Duplicate { .. })));
    }
}
