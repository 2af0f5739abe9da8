//! Command delivery.
//!
//! Resolves the target and sends the signal mapped to a [`Command`]. A single
//! attempt is made; there are no retries anywhere in this path.

use crate::control::command::{Command, Signal};
use crate::control::error::{ControlError, ControlResult};
use crate::control::resolver::{ProcessFinder, ProcessId, ProcessResolver};

/// Delivers a signal to a process.
pub trait SignalSender {
    fn send(&self, pid: ProcessId, signal: Signal) -> std::io::Result<()>;
}

/// Delivery through `kill(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KillSender;

impl SignalSender for KillSender {
    fn send(&self, pid: ProcessId, signal: Signal) -> std::io::Result<()> {
        nix::sys::signal::kill(pid.into(), nix::sys::signal::Signal::from(signal))
            .map_err(std::io::Error::from)
    }
}

pub struct CommandDispatcher<F, S> {
    resolver: ProcessResolver<F>,
    sender: S,
}

impl<F: ProcessFinder, S: SignalSender> CommandDispatcher<F, S> {
    pub fn new(resolver: ProcessResolver<F>, sender: S) -> Self {
        Self { resolver, sender }
    }

    pub fn resolver(&self) -> &ProcessResolver<F> {
        &self.resolver
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Send `command` to `pid`, or to the single discovered instance when
    /// `pid` is empty. Returns the pid signalled.
    pub fn dispatch(&self, command: Command, pid: &str) -> ControlResult<ProcessId> {
        let signal = command.signal();
        let pid = self.resolver.resolve(pid)?;

        tracing::debug!(%command, %signal, %pid, "Sending signal");
        self.sender
            .send(pid, signal)
            .map_err(|source| ControlError::DeliveryFailed { pid, signal, source })?;

        Ok(pid)
    }

    /// Like [`dispatch`](Self::dispatch), for a command given by name. An
    /// unknown name fails before any discovery or delivery.
    pub fn dispatch_named(&self, command: &str, pid: &str) -> ControlResult<ProcessId> {
        let command: Command = command.parse()?;
        self.dispatch(command, pid)
    }
}
