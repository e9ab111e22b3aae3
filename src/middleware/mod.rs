//! Middleware chain composition.
//!
//! # Data Flow
//! ```text
//! [m0, m1, ..., mN] + terminal T
//!     → compose: root = T; for i = N..0: root = mi(root)
//!     → one callable chain, invoked once per request
//!
//! Execution: m0-pre → m1-pre → ... → T → ... → m1-post → m0-post
//! ```
//!
//! # Design Decisions
//! - A middleware is a transform from "next handler" to "handler"; it decides
//!   whether, when and how often `next` runs
//! - Registration order is outer-to-inner execution order (onion)
//! - Composition is pure construction and cannot fail; faults raised while
//!   the chain executes propagate unless a recovery middleware catches them
//! - The chain is synchronous: no stage suspends, so the staged response is
//!   only ever touched by one thread

pub mod access_log;
pub mod error_pages;
pub mod metrics;
pub mod recovery;
pub mod request_id;

use std::sync::Arc;

use crate::http::Context;

pub use access_log::access_log;
pub use error_pages::ErrorPages;
pub use metrics::record_metrics;
pub use recovery::Recovery;
pub use request_id::request_id;

/// A single stage of the chain: mutates the context's staged response and
/// user values, never writes to the network directly.
pub type HandleFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Wraps a handler with a handler, enabling pre/post behavior around `next`.
pub type Middleware = Arc<dyn Fn(HandleFunc) -> HandleFunc + Send + Sync>;

/// Convenience constructor for a [`HandleFunc`] from a closure.
pub fn handle_fn<F>(f: F) -> HandleFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Folds the middleware list back-to-front around `terminal`, so the first
/// registered middleware ends up outermost.
pub fn compose(middlewares: &[Middleware], terminal: HandleFunc) -> HandleFunc {
    let mut root = terminal;
    for middleware in middlewares.iter().rev() {
        root = middleware(root);
    }
    root
}
