//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate values the signal and discovery paths rely on
//! - Reject reloads that change options fixed at startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::path::Path;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("process.name must not be empty")]
    EmptyProcessName,

    #[error("process.name {0:?} must be an executable name, not a path")]
    ProcessNameIsPath(String),

    #[error("process.finder must not be empty")]
    EmptyFinder,

    #[error("logging.level {level:?} is invalid: {reason}")]
    InvalidLogLevel { level: String, reason: String },

    #[error("{0} must not be an empty path")]
    EmptyPath(&'static str),

    #[error("{0} cannot be changed by a reload")]
    Immutable(&'static str),
}

/// Validate a freshly parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = &config.process.name;
    if name.is_empty() {
        errors.push(ValidationError::EmptyProcessName);
    } else if name.contains('/') {
        errors.push(ValidationError::ProcessNameIsPath(name.clone()));
    }

    if config.process.finder.trim().is_empty() {
        errors.push(ValidationError::EmptyFinder);
    }

    if let Err(e) = EnvFilter::try_new(&config.logging.level) {
        errors.push(ValidationError::InvalidLogLevel {
            level: config.logging.level.clone(),
            reason: e.to_string(),
        });
    }

    if is_empty_path(config.logging.file.as_deref()) {
        errors.push(ValidationError::EmptyPath("logging.file"));
    }
    if is_empty_path(config.endpoint.unix_socket.as_deref()) {
        errors.push(ValidationError::EmptyPath("endpoint.unix_socket"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that a reloaded configuration only changes reloadable options.
pub fn validate_reload(
    current: &ServerConfig,
    next: &ServerConfig,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if current.signals != next.signals {
        errors.push(ValidationError::Immutable("signals.disable"));
    }
    if current.endpoint != next.endpoint {
        errors.push(ValidationError::Immutable("endpoint.unix_socket"));
    }
    if current.logging.file != next.logging.file {
        errors.push(ValidationError::Immutable("logging.file"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_empty_path(path: Option<&Path>) -> bool {
    path.is_some_and(|p| p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.process.name = "/usr/bin/procsignal".into();
        config.process.finder = " ".into();
        config.logging.level = "procsignal=loud".into();
        config.endpoint.unix_socket = Some(PathBuf::new());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyFinder));
        assert!(errors.contains(&ValidationError::EmptyPath("endpoint.unix_socket")));
    }

    #[test]
    fn test_reload_rejects_immutable_changes() {
        let current = ServerConfig::default();

        let mut next = current.clone();
        next.logging.level = "debug".into();
        assert!(validate_reload(&current, &next).is_ok());

        next.signals.disable = true;
        next.endpoint.unix_socket = Some("/tmp/other.sock".into());
        let errors = validate_reload(&current, &next).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::Immutable("signals.disable"),
                ValidationError::Immutable("endpoint.unix_socket"),
            ]
        );
    }
}
