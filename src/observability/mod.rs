//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through `tracing`; JSON output is a config switch
//! - Request-level metrics live in the middleware chain
//!   ([`crate::middleware::metrics`]); this module only initializes sinks
//!   and registers metric descriptions

pub mod logging;
pub mod metrics;
