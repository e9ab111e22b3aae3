//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file
//!     → loader.rs (read + parse)
//!     → validation.rs (semantic checks, all errors at once)
//!     → ServerConfig accepted into the system
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, LoggingConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
