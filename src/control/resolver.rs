//! Target process resolution.
//!
//! # Responsibilities
//! - Accept an explicit pid as-is (no existence check)
//! - Otherwise discover running instances by executable name
//! - Refuse to guess when discovery is empty or ambiguous
//!
//! # Design Decisions
//! - Candidates are recomputed on every call, never cached
//! - The resolving process excludes itself, since it usually runs the
//!   same executable as the target

use std::fmt;
use std::process::Command as Subprocess;

use crate::control::error::{ControlError, ControlResult};

/// An OS process id. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(i32);

impl ProcessId {
    /// Wrap a raw pid; `None` for zero or negative values, which `kill(2)`
    /// treats as process groups.
    pub fn new(raw: i32) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Pid of the calling process.
    pub fn current() -> Self {
        Self(std::process::id() as i32)
    }

    pub fn as_raw(self) -> i32 {
        self.0
    }

    fn parse(text: &str) -> Option<Self> {
        text.parse::<i32>().ok().and_then(Self::new)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ProcessId> for nix::unistd::Pid {
    fn from(pid: ProcessId) -> Self {
        nix::unistd::Pid::from_raw(pid.0)
    }
}

/// Why discovery produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindError {
    /// The facility ran and matched nothing.
    NoMatches,
    /// The facility could not run or failed for another reason.
    Failed(String),
}

/// Lists pids of processes matching the managed executable, one per line.
pub trait ProcessFinder {
    fn find(&self) -> Result<Vec<u8>, FindError>;
}

impl<F> ProcessFinder for F
where
    F: Fn() -> Result<Vec<u8>, FindError>,
{
    fn find(&self) -> Result<Vec<u8>, FindError> {
        self()
    }
}

/// `pgrep`-compatible discovery through a subprocess.
#[derive(Debug, Clone)]
pub struct PgrepFinder {
    program: String,
    process_name: String,
}

/// pgrep's status for "no processes matched".
const PGREP_NO_MATCH: i32 = 1;

impl PgrepFinder {
    pub fn new(program: impl Into<String>, process_name: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            process_name: process_name.into(),
        }
    }
}

impl ProcessFinder for PgrepFinder {
    fn find(&self) -> Result<Vec<u8>, FindError> {
        let output = Subprocess::new(&self.program)
            .arg(&self.process_name)
            .output()
            .map_err(|e| FindError::Failed(format!("failed to run {}: {}", self.program, e)))?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        match output.status.code() {
            Some(PGREP_NO_MATCH) => Err(FindError::NoMatches),
            _ => Err(FindError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

/// Produces exactly one target pid.
pub struct ProcessResolver<F> {
    finder: F,
    process_name: String,
    own_pid: ProcessId,
}

impl<F: ProcessFinder> ProcessResolver<F> {
    pub fn new(finder: F, process_name: impl Into<String>) -> Self {
        Self {
            finder,
            process_name: process_name.into(),
            own_pid: ProcessId::current(),
        }
    }

    /// Override the pid excluded from discovery.
    pub fn with_own_pid(mut self, pid: ProcessId) -> Self {
        self.own_pid = pid;
        self
    }

    pub fn finder(&self) -> &F {
        &self.finder
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Resolve `pid`, or discover the single running instance when empty.
    pub fn resolve(&self, pid: &str) -> ControlResult<ProcessId> {
        if !pid.is_empty() {
            return ProcessId::parse(pid)
                .ok_or_else(|| ControlError::InvalidArgument(pid.to_string()));
        }

        let mut pids = self.candidates()?;
        match pids.len() {
            0 => Err(ControlError::NotRunning(self.process_name.clone())),
            1 => Ok(pids.remove(0)),
            _ => Err(ControlError::AmbiguousTarget {
                name: self.process_name.clone(),
                pids,
            }),
        }
    }

    /// Running instances other than this process, in discovery order.
    pub fn candidates(&self) -> ControlResult<Vec<ProcessId>> {
        let output = match self.finder.find() {
            Ok(output) => output,
            Err(FindError::NoMatches) => Vec::new(),
            Err(FindError::Failed(reason)) => {
                tracing::debug!(%reason, "Process discovery failed");
                return Err(ControlError::ResolutionUnavailable { reason });
            }
        };

        let text = String::from_utf8_lossy(&output);
        let mut pids = Vec::new();
        for line in text.split('\n').filter(|l| !l.is_empty()) {
            let pid = ProcessId::parse(line).ok_or_else(|| ControlError::ResolutionUnavailable {
                reason: format!("malformed discovery output line {:?}", line),
            })?;
            if pid != self.own_pid {
                pids.push(pid);
            }
        }

        tracing::debug!(name = %self.process_name, count = pids.len(), "Discovered candidates");
        Ok(pids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn pid(raw: i32) -> ProcessId {
        ProcessId::new(raw).unwrap()
    }

    fn resolver(output: &'static str) -> ProcessResolver<impl ProcessFinder> {
        ProcessResolver::new(move || Ok::<_, FindError>(output.as_bytes().to_vec()), "procsignal")
            .with_own_pid(pid(5678))
    }

    #[test]
    fn test_explicit_pid_skips_discovery() {
        let calls = Cell::new(0);
        let finder = || {
            calls.set(calls.get() + 1);
            Ok::<_, FindError>(b"1\n2\n".to_vec())
        };
        let resolver = ProcessResolver::new(finder, "procsignal");

        assert_eq!(resolver.resolve("4321").unwrap(), pid(4321));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_invalid_pid() {
        let resolver = resolver("");
        for bad in ["abc", "12x", " 12", "0", "-5", "99999999999"] {
            let err = resolver.resolve(bad).unwrap_err();
            assert!(matches!(err, ControlError::InvalidArgument(ref s) if s == bad), "{bad}");
        }
    }

    #[test]
    fn test_excludes_own_pid() {
        assert_eq!(resolver("1234\n5678\n").resolve("").unwrap(), pid(1234));
        assert_eq!(resolver("5678\n1234").resolve("").unwrap(), pid(1234));
    }

    #[test]
    fn test_only_self_is_not_running() {
        let err = resolver("5678\n").resolve("").unwrap_err();
        assert!(matches!(err, ControlError::NotRunning(ref name) if name == "procsignal"));
    }

    #[test]
    fn test_no_matches_is_not_running() {
        let resolver =
            ProcessResolver::new(|| Err::<Vec<u8>, _>(FindError::NoMatches), "procsignal");
        assert!(matches!(resolver.resolve(""), Err(ControlError::NotRunning(_))));
    }

    #[test]
    fn test_finder_failure_is_unavailable() {
        let resolver = ProcessResolver::new(
            || Err::<Vec<u8>, _>(FindError::Failed("not installed".into())),
            "procsignal",
        );
        assert!(matches!(
            resolver.resolve(""),
            Err(ControlError::ResolutionUnavailable { .. })
        ));
    }

    #[test]
    fn test_malformed_line_is_unavailable() {
        let err = resolver("1234\nnope\n").resolve("").unwrap_err();
        assert!(matches!(err, ControlError::ResolutionUnavailable { .. }));
    }

    #[test]
    fn test_ambiguous_keeps_discovery_order() {
        let err = resolver("300\n5678\n100\n200\n").resolve("").unwrap_err();
        match &err {
            ControlError::AmbiguousTarget { pids, .. } => {
                assert_eq!(pids, &vec![pid(300), pid(100), pid(200)]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().ends_with(":\n300\n100\n200"));
    }

    #[test]
    fn test_pgrep_finder_missing_program() {
        let finder = PgrepFinder::new("/nonexistent/pgrep-procsignal", "procsignal");
        assert!(matches!(finder.find(), Err(FindError::Failed(_))));
    }

    #[test]
    fn test_pgrep_finder_exit_status() {
        // exit 0: output is passed through, even when empty
        assert_eq!(PgrepFinder::new("true", "procsignal").find(), Ok(Vec::new()));
        // exit 1: pgrep's "nothing matched"
        assert_eq!(PgrepFinder::new("false", "procsignal").find(), Err(FindError::NoMatches));
        // exit 2: a real failure, not an empty result
        let missing = PgrepFinder::new("ls", "/nonexistent/procsignal").find();
        assert!(matches!(
            missing,
            Err(FindError::Failed(ref reason)) if reason.starts_with("ls exited")
        ));
    }

    #[test]
    fn test_pgrep_finder_passes_output_through() {
        let finder = PgrepFinder::new("echo", "4242");
        assert_eq!(finder.find(), Ok(b"4242\n".to_vec()));

        let resolver = ProcessResolver::new(finder, "procsignal");
        assert_eq!(resolver.resolve("").unwrap(), pid(4242));
    }
}
