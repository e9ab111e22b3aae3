//! Template rendering boundary.
//!
//! The dispatcher never renders anything itself; handlers reach a pluggable
//! engine through [`crate::http::Context::render`]. Engines index templates
//! by name and receive the data as a JSON value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{0}` is not registered")]
    NotFound(String),

    #[error("template rendering failed: {0}")]
    Render(String),
}

/// Contract for a template engine collaborator.
///
/// A failed render is surfaced to the calling handler as an error; it is
/// never auto-converted into a response.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<Vec<u8>, TemplateError>;
}
