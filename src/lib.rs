//! Embeddable HTTP request dispatcher.
//!
//! Given a method and path, find the right handler in a per-method routing
//! trie (static, `:param` and `*` segments, conflict-checked at registration,
//! no backtracking at lookup) and run it inside an onion of middleware with a
//! staged response that is flushed to the network exactly once.
//!
//! # Architecture Overview
//!
//! ```text
//!  Client Request
//!  ──────────────▶ http::server (axum boundary, buffer body, fresh Context)
//!                      │
//!                      ▼
//!                  middleware chain          m0-pre → m1-pre → ...
//!                      │                                          │
//!                      ▼                                          ▼
//!                  routing (trie lookup,              route-serve terminal
//!                  bind :params, pattern)             invokes the handler
//!                      │
//!                      ▼
//!                  flush stage: staged status/body → ResponseSink, once
//!                      │
//!  Client Response ◀───┘
//!
//!  Cross-cutting: config │ observability │ template boundary
//! ```
//!
//! # Design Decisions
//! - Two-phase lifecycle: `ServerBuilder` mutates, `build()` freezes; the
//!   serving side is read-only and needs no locks
//! - Handlers and middleware stage the response on the `Context`; only the
//!   flush stage touches the sink
//! - The chain is synchronous end-to-end; timeouts and cancellation belong
//!   to the platform layer
//! - Route precedence is static > parameter > wildcard, with no backtracking

// Core subsystems
pub mod http;
pub mod routing;

// Chain
pub mod middleware;

// Cross-cutting concerns
pub mod config;
pub mod observability;
pub mod template;

pub use config::ServerConfig;
pub use http::{BufferedSink, Context, ContextError, HttpServer, ResponseSink, ServerBuilder};
pub use middleware::{compose, handle_fn, HandleFunc, Middleware};
pub use routing::{RouteError, RouteMatch, Router};
pub use template::{TemplateEngine, TemplateError};
