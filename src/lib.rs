//! Signal-based lifecycle control for long-running servers.

pub mod config;
pub mod control;
pub mod lifecycle;
pub mod observability;
pub mod server;

pub use config::schema::ServerConfig;
pub use control::{Command, CommandDispatcher, ControlError, ProcessResolver};
pub use lifecycle::{handle_signals, ListenerState, ManagedProcess, SignalListener};
pub use server::Server;
