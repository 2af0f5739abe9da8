//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT, SIGUSR1, SIGHUP)
//! - Translate signals to managed-process callbacks
//! - Report the terminal state so the binary can exit
//!
//! # State Transitions
//! ```text
//! Running → Running:      SIGUSR1 (reopen logs), SIGHUP (reload config)
//! Running → ShuttingDown: SIGINT (close endpoint, then exit 0)
//! ShuttingDown:           terminal, further signals are ignored
//! ```
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGKILL is never handled; `stop` must work on an unresponsive process
//! - Callback failures are logged, never fatal
//! - One signal is fully handled before the next is read

use std::io;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, SignalConfig};
use crate::control::Signal;

/// Callbacks the listener drives on the managed server.
pub trait ManagedProcess: Send + Sync + 'static {
    /// Release any exposed interprocess endpoint (e.g. remove a unix socket).
    fn close_exposed_endpoint(&self);

    /// Reopen log output after external rotation.
    fn reopen_log_output(&self) -> io::Result<()>;

    /// Re-read and apply configuration.
    fn reload_configuration(&self) -> Result<(), ConfigError>;
}

/// Listener state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Running,
    ShuttingDown,
}

impl ListenerState {
    /// Process exit status once the state is terminal.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            ListenerState::Running => None,
            ListenerState::ShuttingDown => Some(0),
        }
    }
}

/// Maps received signals to lifecycle actions on a [`ManagedProcess`].
pub struct SignalListener<P: ?Sized> {
    process: Arc<P>,
    state: ListenerState,
}

impl<P: ManagedProcess + ?Sized> SignalListener<P> {
    pub fn new(process: Arc<P>) -> Self {
        Self {
            process,
            state: ListenerState::Running,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Handle one signal and return the resulting state.
    pub fn handle(&mut self, signal: Signal) -> ListenerState {
        if self.state == ListenerState::ShuttingDown {
            tracing::debug!(%signal, "Ignoring signal during shutdown");
            return self.state;
        }

        tracing::debug!(%signal, "Trapped signal");
        match signal {
            Signal::Interrupt => {
                self.process.close_exposed_endpoint();
                tracing::info!("Server exiting");
                self.state = ListenerState::ShuttingDown;
            }
            Signal::User1 => {
                if let Err(e) = self.process.reopen_log_output() {
                    tracing::error!(error = %e, "Failed to reopen log output");
                }
            }
            Signal::Hangup => {
                if let Err(e) = self.process.reload_configuration() {
                    tracing::error!(error = %e, "Failed to reload server configuration");
                }
            }
            Signal::Kill => tracing::warn!(%signal, "Signal is not handled by the listener"),
        }
        self.state
    }

    /// Handle signals from `rx` until shutdown or until the channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Signal>) -> ListenerState {
        while let Some(signal) = rx.recv().await {
            if self.handle(signal) == ListenerState::ShuttingDown {
                break;
            }
        }
        self.state
    }
}

/// Install the listener for `process` unless signals are disabled.
///
/// Must be called within a Tokio runtime. The returned task completes with
/// [`ListenerState::ShuttingDown`] after SIGINT; the caller is expected to
/// exit the process with [`ListenerState::exit_code`].
pub fn handle_signals<P>(
    config: &SignalConfig,
    process: Arc<P>,
) -> io::Result<Option<JoinHandle<ListenerState>>>
where
    P: ManagedProcess + ?Sized,
{
    if config.disable {
        tracing::info!("Signal handling disabled");
        return Ok(None);
    }

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut user1 = signal(SignalKind::user_defined1())?;
    let mut hangup = signal(SignalKind::hangup())?;

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        loop {
            let signal = tokio::select! {
                Some(()) = interrupt.recv() => Signal::Interrupt,
                Some(()) = user1.recv() => Signal::User1,
                Some(()) = hangup.recv() => Signal::Hangup,
                else => break,
            };
            if tx.send(signal).await.is_err() {
                break;
            }
        }
    });

    tracing::debug!(signals = ?Signal::LISTENED, "Signal handlers installed");
    Ok(Some(tokio::spawn(SignalListener::new(process).run(rx))))
}
