//! The managed server process.
//!
//! # Responsibilities
//! - Own the live configuration and swap it on reload
//! - Expose a unix-socket endpoint that reports the server pid
//! - Implement the callbacks driven by the signal listener
//!
//! # Design Decisions
//! - Live config behind `ArcSwap`: readers never block a reload
//! - Command-line overrides are reapplied on every reload
//! - Reload is all-or-nothing; any error keeps the running config

use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;

use crate::config::{
    load_config, validate_config, validate_reload, ConfigError, ConfigOverrides, ServerConfig,
};
use crate::control::ProcessId;
use crate::lifecycle::ManagedProcess;
use crate::observability::Logging;

pub struct Server {
    config: ArcSwap<ServerConfig>,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    logging: Logging,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        config_path: Option<PathBuf>,
        overrides: ConfigOverrides,
        logging: Logging,
    ) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            config_path,
            overrides,
            logging,
        }
    }

    /// Snapshot of the live configuration.
    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.load_full()
    }

    /// Bind the configured unix socket, if any. A socket file left behind by
    /// a killed instance is replaced; one that still accepts connections is not.
    pub fn bind_endpoint(&self) -> io::Result<Option<UnixListener>> {
        let config = self.config.load();
        let Some(path) = config.endpoint.unix_socket.as_deref() else {
            return Ok(None);
        };

        clear_stale_socket(path)?;
        let listener = UnixListener::bind(path)?;
        tracing::info!(path = %path.display(), "Endpoint listening");
        Ok(Some(listener))
    }

    /// Serve until the process exits, answering each connection with the pid.
    pub async fn run(&self) -> io::Result<()> {
        match self.bind_endpoint()? {
            Some(listener) => serve_endpoint(listener).await,
            None => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

/// Pause after a failed accept (e.g. EMFILE) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

async fn serve_endpoint(listener: UnixListener) -> io::Result<()> {
    let reply = format!("{}\n", ProcessId::current());
    loop {
        match listener.accept().await {
            Ok((mut stream, _)) => {
                let reply = reply.clone();
                tokio::spawn(async move {
                    if let Err(e) = stream.write_all(reply.as_bytes()).await {
                        tracing::debug!(error = %e, "Endpoint write failed");
                    }
                    let _ = stream.shutdown().await;
                });
            }
            Err(e) => accept_failed(&e).await,
        }
    }
}

async fn accept_failed(e: &io::Error) {
    tracing::warn!(error = %e, "Endpoint accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

fn clear_stale_socket(path: &Path) -> io::Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if !metadata.file_type().is_socket() {
        // Not ours to delete; let bind report it.
        return Ok(());
    }
    if StdUnixStream::connect(path).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("{} is in use by a running instance", path.display()),
        ));
    }

    tracing::info!(path = %path.display(), "Removing stale unix socket");
    remove_socket(path)
}

fn remove_socket(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl ManagedProcess for Server {
    fn close_exposed_endpoint(&self) {
        let config = self.config.load();
        let Some(path) = config.endpoint.unix_socket.as_deref() else {
            return;
        };
        match remove_socket(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed unix socket"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove unix socket")
            }
        }
    }

    fn reopen_log_output(&self) -> io::Result<()> {
        self.logging.reopen()
    }

    fn reload_configuration(&self) -> Result<(), ConfigError> {
        let path = self.config_path.as_deref().ok_or_else(|| {
            ConfigError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no configuration file to reload",
            ))
        })?;

        let mut next = load_config(path)?;
        self.overrides.apply(&mut next);
        validate_config(&next).map_err(ConfigError::Validation)?;

        let current = self.config.load();
        validate_reload(&current, &next).map_err(ConfigError::Validation)?;

        if next.logging.level != current.logging.level {
            if let Err(e) = self.logging.set_level(&next.logging.level) {
                tracing::warn!(error = %e, "Keeping previous log level");
            }
        }

        self.config.store(Arc::new(next));
        tracing::info!(path = %path.display(), "Reloaded server configuration");
        Ok(())
    }
}
