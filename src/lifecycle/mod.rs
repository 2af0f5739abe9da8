//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT  → close endpoint → ShuttingDown → exit 0
//!     SIGUSR1 → reopen log output
//!     SIGHUP  → reload configuration
//!     SIGKILL → never seen (immediate stop)
//! ```
//!
//! # Design Decisions
//! - The listener owns no server state; it drives `ManagedProcess` callbacks
//! - Shutdown is a state transition the binary observes, not a hidden exit

pub mod signals;

pub use signals::{handle_signals, ListenerState, ManagedProcess, SignalListener};
