//! Per-method routing trie.
//!
//! # Responsibilities
//! - Store routes as a trie of path segments, one trie per HTTP method
//! - Detect pattern and conflict errors at registration time
//! - Resolve a request path to a handler without backtracking
//!
//! # Design Decisions
//! - Segment kinds are decided per segment in isolation: `*` is a wildcard,
//!   a leading `:` marks a named parameter, everything else is static
//! - A node may hold a parameter child or a wildcard child, never both
//! - A matched wildcard absorbs any remaining request segments
//! - The router is generic over the stored value so it can be exercised
//!   without constructing handlers

use std::collections::HashMap;

use axum::http::Method;
use thiserror::Error;

/// Errors raised while registering a route. These are configuration errors:
/// they are returned synchronously from [`Router::register`] and must abort
/// startup, never surface at request time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route pattern is empty")]
    EmptyPattern,

    #[error("route pattern `{0}` must start with `/`")]
    MissingLeadingSlash(String),

    #[error("route pattern `{0}` must not end with `/`")]
    TrailingSlash(String),

    #[error("route pattern `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("route `{method} {path}` is already registered")]
    Duplicate { method: Method, path: String },

    #[error(
        "cannot register wildcard segment in `{path}`: the node already has \
         parameter child `{existing}`"
    )]
    WildcardAfterParam { path: String, existing: String },

    #[error(
        "cannot register parameter segment in `{path}`: the node already has \
         a wildcard child"
    )]
    ParamAfterWildcard { path: String },

    #[error(
        "parameter conflict in `{path}`: node is already bound as \
         `{existing}`, refusing to rebind as `{requested}`"
    )]
    ParamNameMismatch {
        path: String,
        existing: String,
        requested: String,
    },
}

/// One node of a routing trie.
///
/// Owns its static children exclusively; there are no back references and no
/// sharing across methods. Nodes are created lazily during registration and
/// never deleted.
#[derive(Debug)]
pub struct Node<T> {
    /// Literal segment text, `:name` for parameter nodes, `*` for wildcards.
    segment: String,
    /// Static children, keyed by exact segment text.
    children: HashMap<String, Node<T>>,
    /// At most one parameter child per node.
    param_child: Option<Box<Node<T>>>,
    /// At most one wildcard child per node.
    wildcard_child: Option<Box<Node<T>>>,
    /// Bound handler; `None` means the node only exists structurally.
    handler: Option<T>,
    /// Full route pattern, set on the node where a route terminates.
    route: String,
}

impl<T> Node<T> {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            children: HashMap::new(),
            param_child: None,
            wildcard_child: None,
            handler: None,
            route: String::new(),
        }
    }

    /// The handler bound to this node, if a route terminates here.
    pub fn handler(&self) -> Option<&T> {
        self.handler.as_ref()
    }

    /// The full route pattern that terminates at this node (diagnostics).
    pub fn route(&self) -> &str {
        &self.route
    }

    fn is_wildcard(&self) -> bool {
        self.segment == "*"
    }

    /// Walks to the child for `segment`, creating it if absent.
    /// `path` is the full pattern, carried for error reporting only.
    fn child_or_create(&mut self, segment: &str, path: &str) -> Result<&mut Node<T>, RouteError> {
        if segment == "*" {
            if let Some(param) = &self.param_child {
                return Err(RouteError::WildcardAfterParam {
                    path: path.to_string(),
                    existing: param.segment.clone(),
                });
            }
            return Ok(self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new(segment))));
        }

        if segment.starts_with(':') {
            if self.wildcard_child.is_some() {
                return Err(RouteError::ParamAfterWildcard {
                    path: path.to_string(),
                });
            }
            if let Some(param) = &self.param_child {
                if param.segment != segment {
                    return Err(RouteError::ParamNameMismatch {
                        path: path.to_string(),
                        existing: param.segment.clone(),
                        requested: segment.to_string(),
                    });
                }
            }
            return Ok(self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new(segment))));
        }

        Ok(self
            .children
            .entry(segment.to_string())
            .or_insert_with(|| Node::new(segment)))
    }

    /// Resolves one request segment in strict priority order:
    /// static child, then parameter child, then wildcard child.
    /// The second tuple element reports whether a parameter child matched.
    fn child_of(&self, segment: &str) -> Option<(&Node<T>, bool)> {
        if let Some(child) = self.children.get(segment) {
            return Some((child, false));
        }
        if let Some(param) = &self.param_child {
            return Some((param, true));
        }
        self.wildcard_child.as_deref().map(|w| (w, false))
    }
}

/// Outcome of a successful structural lookup.
///
/// The matched node may still carry no handler; callers must treat that as
/// not-found.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    node: &'a Node<T>,
    /// Parameter bindings collected along the matched path. A parameter name
    /// matched at several depths is last-write-wins (inherited behavior).
    pub params: HashMap<String, String>,
}

impl<'a, T> RouteMatch<'a, T> {
    pub fn handler(&self) -> Option<&'a T> {
        self.node.handler()
    }

    pub fn route(&self) -> &'a str {
        self.node.route()
    }
}

/// Route table: one trie per HTTP method.
///
/// The table is built during the startup mutation phase and must be frozen
/// before serving begins; lookups take `&self` and are safe for
/// unsynchronized concurrent reads once no writer remains.
#[derive(Debug, Default)]
pub struct Router<T> {
    trees: HashMap<Method, Node<T>>,
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }

    /// Registers `handler` under `method` + `path`.
    ///
    /// The pattern must start with `/`, must not end with `/` unless it is
    /// exactly `/`, and must not contain empty segments. Re-registering a
    /// path, or mixing wildcard and parameter children on one node, is a
    /// conflict; the earlier registration stays bound.
    pub fn register(&mut self, method: Method, path: &str, handler: T) -> Result<(), RouteError> {
        if path.is_empty() {
            return Err(RouteError::EmptyPattern);
        }
        if !path.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(path.to_string()));
        }
        if path != "/" && path.ends_with('/') {
            return Err(RouteError::TrailingSlash(path.to_string()));
        }
        if path != "/" && path[1..].split('/').any(|s| s.is_empty()) {
            return Err(RouteError::EmptySegment(path.to_string()));
        }

        let root = self
            .trees
            .entry(method.clone())
            .or_insert_with(|| Node::new("/"));

        let mut current = root;
        if path != "/" {
            for segment in path[1..].split('/') {
                current = current.child_or_create(segment, path)?;
            }
        }

        if current.handler.is_some() {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }
        current.handler = Some(handler);
        current.route = path.to_string();
        Ok(())
    }

    /// Looks up the trie for `method` + `path`.
    ///
    /// Leading and trailing slashes on the request path are tolerated. Each
    /// segment is resolved static-first; if nothing matches and the current
    /// node is a wildcard, the wildcard absorbs the remaining segments.
    /// Returns `None` when the structure does not cover the path at all.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let root = self.trees.get(method)?;

        if path == "/" {
            return Some(RouteMatch {
                node: root,
                params: HashMap::new(),
            });
        }

        let mut current = root;
        let mut params = HashMap::new();
        for segment in path.trim_matches('/').split('/') {
            match current.child_of(segment) {
                Some((child, matched_param)) => {
                    if matched_param {
                        params.insert(child.segment[1..].to_string(), segment.to_string());
                    }
                    current = child;
                }
                None if current.is_wildcard() => break,
                None => return None,
            }
        }

        Some(RouteMatch {
            node: current,
            params,
        })
    }
}
