//! Lifecycle commands and the signals they map to.

use std::fmt;
use std::str::FromStr;

use crate::control::error::ControlError;

/// A lifecycle operation an operator can request of a running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Kill immediately. Never observed by the target.
    Stop,
    /// Graceful exit.
    Quit,
    /// Reopen log output (log rotation).
    Reopen,
    /// Reload configuration.
    Reload,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Stop, Command::Quit, Command::Reopen, Command::Reload];

    /// The signal delivered for this command.
    pub fn signal(self) -> Signal {
        match self {
            Command::Stop => Signal::Kill,
            Command::Quit => Signal::Interrupt,
            Command::Reopen => Signal::User1,
            Command::Reload => Signal::Hangup,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Stop => "stop",
            Command::Quit => "quit",
            Command::Reopen => "reopen",
            Command::Reload => "reload",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ControlError::UnknownCommand(s.to_string()))
    }
}

/// The OS signals this crate sends or listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// SIGKILL, cannot be caught.
    Kill,
    /// SIGINT
    Interrupt,
    /// SIGUSR1
    User1,
    /// SIGHUP
    Hangup,
}

impl Signal {
    /// Signals the in-process listener subscribes to.
    pub const LISTENED: [Signal; 3] = [Signal::Interrupt, Signal::User1, Signal::Hangup];

    pub fn is_listened(self) -> bool {
        Self::LISTENED.contains(&self)
    }
}

impl From<Signal> for nix::sys::signal::Signal {
    fn from(signal: Signal) -> Self {
        use nix::sys::signal::Signal as Os;
        match signal {
            Signal::Kill => Os::SIGKILL,
            Signal::Interrupt => Os::SIGINT,
            Signal::User1 => Os::SIGUSR1,
            Signal::Hangup => Os::SIGHUP,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(nix::sys::signal::Signal::from(*self).as_str())
    }
}

/// A `<command>[=<pid>]` request, as given to `--signal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalRequest {
    pub command: Command,
    /// Raw pid text; empty means "discover".
    pub pid: String,
}

impl FromStr for SignalRequest {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (command, pid) = s.split_once('=').unwrap_or((s, ""));
        Ok(Self {
            command: command.parse()?,
            pid: pid.to_string(),
        })
    }
}
