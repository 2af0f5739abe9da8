//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing macros (structured log events)
//!     → logging.rs (filter + fmt layer)
//!     → stdout, or a log file reopened on SIGUSR1
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event
//! - Log level can be changed by a config reload without restarting
//! - File output survives external rotation via reopen

pub mod logging;

pub use logging::{init_logging, Logging, LoggingError};
