//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Write to stdout or to a reopenable log file
//! - Change the log level at runtime
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level at startup
//! - The file handle is swapped under a mutex; writers never see a closed file

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Errors from logging setup and runtime changes.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },

    #[error("failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Init(String),

    #[error("failed to apply log level: {0}")]
    Reload(String),
}

/// A subscriber ready to be installed, type-erased.
pub type BoxedSubscriber = Box<dyn tracing::Subscriber + Send + Sync>;

/// An append-mode log file that can be reopened in place after rotation.
#[derive(Debug)]
pub struct ReopenableFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl ReopenableFile {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(open_append(path)?),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the handle with a fresh one for the same path.
    pub fn reopen(&self) -> io::Result<()> {
        let fresh = open_append(&self.path)?;
        let mut file = self.lock()?;
        file.flush()?;
        *file = fresh;
        Ok(())
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `MakeWriter` over a shared [`ReopenableFile`].
#[derive(Debug, Clone)]
pub struct LogWriter(Arc<ReopenableFile>);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock()?.flush()
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runtime controls for the installed subscriber.
pub struct Logging {
    filter: reload::Handle<EnvFilter, Registry>,
    file: Option<Arc<ReopenableFile>>,
}

impl Logging {
    /// Reopen the log file. Does nothing when logging to stdout.
    pub fn reopen(&self) -> io::Result<()> {
        match &self.file {
            Some(file) => {
                file.reopen()?;
                tracing::info!(path = %file.path().display(), "Reopened log file");
            }
            None => tracing::info!("Log reopen ignored, not logging to a file"),
        }
        Ok(())
    }

    /// Swap the active filter for `level`.
    pub fn set_level(&self, level: &str) -> Result<(), LoggingError> {
        let filter = parse_filter(level)?;
        self.filter
            .reload(filter)
            .map_err(|e| LoggingError::Reload(e.to_string()))
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref().map(ReopenableFile::path)
    }
}

/// Build the subscriber for `config` without installing it.
pub fn build_logging(config: &LoggingConfig) -> Result<(Logging, BoxedSubscriber), LoggingError> {
    build(config, parse_filter(&config.level)?)
}

/// Build and install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<Logging, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.level)?,
    };
    let (logging, subscriber) = build(config, filter)?;

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LoggingError::Init(e.to_string()))?;
    Ok(logging)
}

fn build(
    config: &LoggingConfig,
    filter: EnvFilter,
) -> Result<(Logging, BoxedSubscriber), LoggingError> {
    let file = match &config.file {
        Some(path) => Some(Arc::new(ReopenableFile::open(path).map_err(|source| {
            LoggingError::Open {
                path: path.clone(),
                source,
            }
        })?)),
        None => None,
    };

    let (filter, handle) = reload::Layer::new(filter);
    let file_layer = file
        .clone()
        .map(|f| fmt::layer().with_ansi(false).with_writer(LogWriter(f)));
    let stdout_layer = file.is_none().then(fmt::layer);

    let subscriber: BoxedSubscriber = Box::new(
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(stdout_layer),
    );

    Ok((
        Logging {
            filter: handle,
            file,
        },
        subscriber,
    ))
}

fn parse_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directive).map_err(|e| LoggingError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("procsignal-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_reopen_follows_rotation() {
        let path = temp_path("rotate.log");
        let rotated = temp_path("rotate.log.1");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_file(&rotated);

        let config = LoggingConfig {
            level: "info".into(),
            file: Some(path.clone()),
        };
        let (logging, subscriber) = build_logging(&config).unwrap();
        assert_eq!(logging.file_path(), Some(path.as_path()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("before rotation");
            fs::rename(&path, &rotated).unwrap();
            logging.reopen().unwrap();
            tracing::info!("after rotation");
        });

        let old = fs::read_to_string(&rotated).unwrap();
        let new = fs::read_to_string(&path).unwrap();
        assert!(old.contains("before rotation"));
        assert!(!old.contains("after rotation"));
        assert!(new.contains("after rotation"));

        let _ = fs::remove_file(&path);
        let _ = fs::remove_file(&rotated);
    }

    #[test]
    fn test_reopen_without_file_is_noop() {
        let (logging, _subscriber) = build_logging(&LoggingConfig::default()).unwrap();
        assert!(logging.file_path().is_none());
        assert!(logging.reopen().is_ok());
    }

    #[test]
    fn test_set_level() {
        let (logging, _subscriber) = build_logging(&LoggingConfig::default()).unwrap();
        assert!(logging.set_level("debug").is_ok());
        assert!(matches!(
            logging.set_level("procsignal=loud"),
            Err(LoggingError::Filter { .. })
        ));
    }

    #[test]
    fn test_unwritable_file() {
        let config = LoggingConfig {
            level: "info".into(),
            file: Some("/nonexistent/dir/procsignal.log".into()),
        };
        assert!(matches!(build_logging(&config), Err(LoggingError::Open { .. })));
    }
}
