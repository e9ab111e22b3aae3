//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup, mutation phase):
//!     register(method, path, handler)
//!     → validate pattern (leading slash, no trailing slash, no empty segment)
//!     → walk/create trie nodes segment by segment
//!     → bind handler at the terminal node, record full pattern
//!
//! Lookup (serving, read-only phase):
//!     find(method, path)
//!     → per segment: static child → parameter child → wildcard child
//!     → Return: matched node + collected parameter bindings, or no match
//! ```
//!
//! # Design Decisions
//! - One trie per HTTP method; method dispatch is a map lookup
//! - No backtracking: the first strategy that matches a segment wins, so
//!   precedence is always static > parameter > wildcard and lookup stays
//!   O(segments)
//! - All pattern and conflict errors are reported at registration time; an
//!   invalid route table never reaches the serving phase

pub mod tree;

pub use tree::{Node, RouteError, RouteMatch, Router};
