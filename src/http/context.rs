//! Per-request context shared across the middleware chain.
//!
//! # Responsibilities
//! - Hold the buffered request and the response sink for one request
//! - Stage the response (status + body) until the flush stage commits it
//! - Carry path parameter bindings and the matched route pattern
//! - Offer typed access to the user-value bag middleware communicate through
//!
//! # Design Decisions
//! - Handlers and middleware mutate `resp_status`/`resp_data` instead of the
//!   sink; a direct write would bypass every later middleware's chance to
//!   observe or rewrite the response
//! - `resp_status == 0` means "unset": the flush stage then leaves the
//!   status to the sink's default instead of committing a zero
//! - The context is exclusively owned by one request's execution path and
//!   dropped after the flush; it is never shared across requests

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::http::sink::ResponseSink;
use crate::template::{TemplateEngine, TemplateError};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("path parameter `{0}` is not bound")]
    MissingPathParam(String),

    #[error("query parameter `{0}` is not present")]
    MissingQueryParam(String),

    #[error("no user value stored under key `{0}`")]
    MissingValue(String),

    #[error("user value under key `{0}` has a different type")]
    ValueTypeMismatch(String),

    #[error("request body is empty")]
    EmptyBody,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no template engine configured")]
    NoTemplateEngine,

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Mutable per-request state threaded through the chain.
pub struct Context {
    req: Request<Bytes>,
    pub(crate) sink: Box<dyn ResponseSink>,

    /// Staged response body; committed by the flush stage, last writer wins.
    pub resp_data: Vec<u8>,
    /// Staged status code; 0 means unset (sink default).
    pub resp_status: u16,

    /// Bindings collected by the route-serve stage.
    pub path_params: HashMap<String, String>,
    /// Route pattern that matched, empty until routing ran (observability).
    pub matched_route: String,

    user_values: HashMap<String, Box<dyn Any + Send>>,
    query_cache: Option<HashMap<String, String>>,
    template_engine: Option<Arc<dyn TemplateEngine>>,
}

impl Context {
    pub fn new(req: Request<Bytes>, sink: Box<dyn ResponseSink>) -> Self {
        Self {
            req,
            sink,
            resp_data: Vec::new(),
            resp_status: 0,
            path_params: HashMap::new(),
            matched_route: String::new(),
            user_values: HashMap::new(),
            query_cache: None,
            template_engine: None,
        }
    }

    pub(crate) fn set_template_engine(&mut self, engine: Arc<dyn TemplateEngine>) {
        self.template_engine = Some(engine);
    }

    /// Read-only view of the buffered request.
    pub fn request(&self) -> &Request<Bytes> {
        &self.req
    }

    pub fn method(&self) -> &Method {
        self.req.method()
    }

    pub fn path(&self) -> &str {
        self.req.uri().path()
    }

    /// First value of a request header, when present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.req.headers().get(name)?.to_str().ok()
    }

    /// The value bound for a named path parameter of the matched route.
    pub fn path_value(&self, key: &str) -> Result<&str, ContextError> {
        self.path_params
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ContextError::MissingPathParam(key.to_string()))
    }

    /// First value of a query parameter. Token extraction only: the query
    /// string is split and percent-decoded, nothing is validated.
    pub fn query_value(&mut self, key: &str) -> Result<&str, ContextError> {
        if self.query_cache.is_none() {
            let raw = self.req.uri().query().unwrap_or("");
            let mut parsed: HashMap<String, String> = HashMap::new();
            for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                parsed.entry(name.into_owned()).or_insert(value.into_owned());
            }
            self.query_cache = Some(parsed);
        }
        self.query_cache
            .as_ref()
            .and_then(|cache| cache.get(key))
            .map(String::as_str)
            .ok_or_else(|| ContextError::MissingQueryParam(key.to_string()))
    }

    /// Deserializes the buffered request body as JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, ContextError> {
        if self.req.body().is_empty() {
            return Err(ContextError::EmptyBody);
        }
        Ok(serde_json::from_slice(self.req.body())?)
    }

    /// Stages a JSON response; nothing is written until the flush stage.
    pub fn resp_json<T: Serialize>(&mut self, status: u16, value: &T) -> Result<(), ContextError> {
        self.resp_data = serde_json::to_vec(value)?;
        self.resp_status = status;
        Ok(())
    }

    /// Stores a value in the user bag for later stages of this request.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Any + Send) {
        self.user_values.insert(key.into(), Box::new(value));
    }

    /// Typed read from the user bag: missing key and wrong expected type are
    /// distinct errors.
    pub fn value<T: Any>(&self, key: &str) -> Result<&T, ContextError> {
        let value = self
            .user_values
            .get(key)
            .ok_or_else(|| ContextError::MissingValue(key.to_string()))?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| ContextError::ValueTypeMismatch(key.to_string()))
    }

    /// Renders a template through the pluggable engine. Failure surfaces to
    /// the caller; it is never converted into a staged response here.
    pub fn render(&self, name: &str, data: &serde_json::Value) -> Result<Vec<u8>, ContextError> {
        let engine = self
            .template_engine
            .as_ref()
            .ok_or(ContextError::NoTemplateEngine)?;
        Ok(engine.render(name, data)?)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::http::BufferedSink;

    fn context_for(uri: &str) -> Context {
        let request = Request::builder().uri(uri).body(Bytes::new()).unwrap();
        Context::new(request, Box::new(BufferedSink::shared()))
    }

    #[test]
    fn path_value_reads_bound_parameters() {
        let mut ctx = context_for("/user/42");
        ctx.path_params.insert("id".into(), "42".into());

        assert_eq!(ctx.path_value("id").unwrap(), "42");
        assert!(matches!(
            ctx.path_value("name"),
            Err(ContextError::MissingPathParam(_))
        ));
    }

    #[test]
    fn query_value_extracts_first_token() {
        let mut ctx = context_for("/search?q=hello%20world&q=second&page=2");

        assert_eq!(ctx.query_value("q").unwrap(), "hello world");
        assert_eq!(ctx.query_value("page").unwrap(), "2");
        assert!(matches!(
            ctx.query_value("missing"),
            Err(ContextError::MissingQueryParam(_))
        ));
    }

    #[test]
    fn user_values_are_typed() {
        let mut ctx = context_for("/");
        ctx.set_value("count", 7usize);

        assert_eq!(*ctx.value::<usize>("count").unwrap(), 7);
        assert!(matches!(
            ctx.value::<String>("count"),
            Err(ContextError::ValueTypeMismatch(_))
        ));
        assert!(matches!(
            ctx.value::<usize>("absent"),
            Err(ContextError::MissingValue(_))
        ));
    }

    #[test]
    fn bind_json_deserializes_the_buffered_body() {
        #[derive(Deserialize)]
        struct Payload {
            name: String,
        }

        let request = Request::builder()
            .uri("/users")
            .body(Bytes::from_static(br#"{"name":"abel"}"#))
            .unwrap();
        let ctx = Context::new(request, Box::new(BufferedSink::shared()));

        let payload: Payload = ctx.bind_json().unwrap();
        assert_eq!(payload.name, "abel");

        let empty = context_for("/users");
        assert!(matches!(
            empty.bind_json::<Payload>(),
            Err(ContextError::EmptyBody)
        ));
    }

    #[test]
    fn resp_json_stages_without_writing() {
        let mut ctx = context_for("/");
        ctx.resp_json(200, &serde_json::json!({"ok": true})).unwrap();

        assert_eq!(ctx.resp_status, 200);
        assert_eq!(ctx.resp_data, br#"{"ok":true}"#);
    }

    #[test]
    fn render_without_engine_is_an_error() {
        let ctx = context_for("/");
        assert!(matches!(
            ctx.render("home", &serde_json::Value::Null),
            Err(ContextError::NoTemplateEngine)
        ));
    }
}
