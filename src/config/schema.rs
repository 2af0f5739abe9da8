//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use std::path::PathBuf;

use serde::Deserialize;

/// Default managed executable name, used for discovery.
pub const DEFAULT_PROCESS_NAME: &str = "procsignal";

/// Root configuration for a managed server.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// In-process signal handling.
    pub signals: SignalConfig,

    /// Identity of the managed process, for the command surface.
    pub process: ProcessConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Interprocess endpoint exposed by the server.
    pub endpoint: EndpointConfig,
}

/// Signal listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct SignalConfig {
    /// Install no signal handlers at all.
    pub disable: bool,
}

/// Discovery settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Executable name matched by the discovery program.
    pub name: String,

    /// Discovery program; invoked as `<finder> <name>`, pgrep-compatible.
    pub finder: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROCESS_NAME.to_string(),
            finder: "pgrep".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or EnvFilter syntax).
    pub level: String,

    /// Log file; stdout when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Interprocess endpoint configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct EndpointConfig {
    /// Unix socket path; no endpoint when unset.
    pub unix_socket: Option<PathBuf>,
}

/// Command-line values layered over the file configuration, reapplied on
/// every reload.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub disable_signals: bool,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub unix_socket: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ServerConfig) {
        if self.disable_signals {
            config.signals.disable = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        if let Some(socket) = &self.unix_socket {
            config.endpoint.unix_socket = Some(socket.clone());
        }
    }
}
