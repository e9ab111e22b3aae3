//! HTTP dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Platform listener (axum)
//!     → server.rs (buffer body, build Context, run frozen chain)
//!     → middleware chain (user stages, outer to inner)
//!     → route-serve terminal (trie lookup, bind params, invoke handler)
//!     → flush stage (staged status/body → ResponseSink, exactly once)
//!     → server.rs (sink contents → HTTP response)
//! ```

pub mod context;
pub mod server;
pub mod sink;

pub use context::{Context, ContextError};
pub use server::{HttpServer, ServerBuilder};
pub use sink::{BufferedSink, ResponseSink};
