//! Command surface for controlling a running instance from outside.
//!
//! # Data Flow
//! ```text
//! "reload" / "reload=<pid>"
//!     → command.rs (Command → Signal)
//!     → resolver.rs (explicit pid, or discovery via ProcessFinder)
//!     → dispatcher.rs (SignalSender delivers exactly once)
//!     → target process: lifecycle::signals
//! ```
//!
//! # Design Decisions
//! - Discovery and delivery are injected traits, not globals
//! - Never guess between several running instances
//! - Synchronous: the caller is a short-lived process

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod resolver;

pub use command::{Command, Signal, SignalRequest};
pub use dispatcher::{CommandDispatcher, KillSender, SignalSender};
pub use error::{ControlError, ControlResult};
pub use resolver::{FindError, PgrepFinder, ProcessFinder, ProcessId, ProcessResolver};
