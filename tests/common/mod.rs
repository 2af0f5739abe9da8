//! Shared fakes for integration tests.

use std::cell::{Cell, RefCell};
use std::io;
use std::sync::{Arc, Mutex};

use procsignal::config::{ConfigError, ValidationError};
use procsignal::control::{FindError, ProcessFinder, ProcessId, Signal, SignalSender};
use procsignal::ManagedProcess;

/// Discovery with canned output that counts its invocations.
pub struct ScriptedFinder {
    result: Result<Vec<u8>, FindError>,
    calls: Cell<usize>,
}

#[allow(dead_code)]
impl ScriptedFinder {
    pub fn output(output: &str) -> Self {
        Self {
            result: Ok(output.as_bytes().to_vec()),
            calls: Cell::new(0),
        }
    }

    pub fn no_matches() -> Self {
        Self {
            result: Err(FindError::NoMatches),
            calls: Cell::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(FindError::Failed(reason.to_string())),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ProcessFinder for ScriptedFinder {
    fn find(&self) -> Result<Vec<u8>, FindError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

/// Records deliveries instead of sending them.
#[derive(Default)]
pub struct RecordingSender {
    sent: RefCell<Vec<(ProcessId, Signal)>>,
}

#[allow(dead_code)]
impl RecordingSender {
    pub fn sent(&self) -> Vec<(ProcessId, Signal)> {
        self.sent.borrow().clone()
    }
}

impl SignalSender for RecordingSender {
    fn send(&self, pid: ProcessId, signal: Signal) -> io::Result<()> {
        self.sent.borrow_mut().push((pid, signal));
        Ok(())
    }
}

/// Managed process that records callbacks; reload always fails.
#[derive(Default)]
pub struct FakeProcess {
    calls: Mutex<Vec<&'static str>>,
}

#[allow(dead_code)]
impl FakeProcess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

impl ManagedProcess for FakeProcess {
    fn close_exposed_endpoint(&self) {
        self.record("close");
    }

    fn reopen_log_output(&self) -> io::Result<()> {
        self.record("reopen");
        Ok(())
    }

    fn reload_configuration(&self) -> Result<(), ConfigError> {
        self.record("reload");
        Err(ConfigError::Validation(vec![ValidationError::Immutable("signals.disable")]))
    }
}

#[allow(dead_code)]
pub fn pid(raw: i32) -> ProcessId {
    ProcessId::new(raw).unwrap()
}
