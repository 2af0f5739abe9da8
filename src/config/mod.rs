//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! On SIGHUP:
//!     loader.rs loads new config
//!     → validation.rs validates, rejects changes to startup-only options
//!     → atomic swap of Arc<ServerConfig>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - A failed reload keeps the running configuration

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ConfigOverrides, EndpointConfig, LoggingConfig, ProcessConfig, ServerConfig, SignalConfig,
};
pub use validation::{validate_config, validate_reload, ValidationError};
