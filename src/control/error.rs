//! Error taxonomy for the command surface.

use thiserror::Error;

use crate::control::command::Signal;
use crate::control::resolver::ProcessId;

/// Errors returned while resolving a target or delivering a signal.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Pid text is not a positive integer.
    #[error("invalid pid: {0}")]
    InvalidArgument(String),

    /// Command name outside the lifecycle set.
    #[error("unknown signal {0:?}")]
    UnknownCommand(String),

    /// Discovery found no candidate.
    #[error("no {0} processes running")]
    NotRunning(String),

    /// Discovery found more than one candidate.
    #[error("multiple {name} processes running:\n{}", join_pids(.pids))]
    AmbiguousTarget { name: String, pids: Vec<ProcessId> },

    /// Discovery could not be performed or produced unusable output.
    #[error("unable to resolve pid, try providing one")]
    ResolutionUnavailable { reason: String },

    /// The OS refused the signal.
    #[error("failed to send {signal} to pid {pid}: {source}")]
    DeliveryFailed {
        pid: ProcessId,
        signal: Signal,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

fn join_pids(pids: &[ProcessId]) -> String {
    pids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ControlError::AmbiguousTarget {
            name: "procsignal".into(),
            pids: vec![ProcessId::new(12).unwrap(), ProcessId::new(34).unwrap()],
        };
        assert_eq!(err.to_string(), "multiple procsignal processes running:\n12\n34");

        let err = ControlError::ResolutionUnavailable { reason: "boom".into() };
        assert_eq!(err.to_string(), "unable to resolve pid, try providing one");

        let err = ControlError::DeliveryFailed {
            pid: ProcessId::new(7).unwrap(),
            signal: Signal::Hangup,
            source: std::io::Error::from_raw_os_error(3),
        };
        assert!(err.to_string().starts_with("failed to send SIGHUP to pid 7"));
    }
}
