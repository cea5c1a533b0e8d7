//! Scripted serial port enumeration

use std::cell::RefCell;
use std::collections::VecDeque;

use brew_detect::{
    ConnectSignal, DetectError, DiscoveryStep, PortDescriptor, PortEnumerator, PortSnapshot,
};
use tracing::debug;

/// Enumerator that replays a list of snapshots
///
/// Each call returns the next scripted snapshot; the last one repeats once
/// the script runs out.
#[derive(Debug, Default)]
pub struct SimPorts {
    script: RefCell<VecDeque<PortSnapshot>>,
    last: RefCell<PortSnapshot>,
}

impl SimPorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the ports present at the next enumeration
    pub fn then(self, ports: impl IntoIterator<Item = PortDescriptor>) -> Self {
        self.script
            .borrow_mut()
            .push_back(ports.into_iter().collect());
        self
    }

    /// Snapshots still queued
    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl PortEnumerator for SimPorts {
    fn snapshot(&self) -> Result<PortSnapshot, DetectError> {
        if let Some(next) = self.script.borrow_mut().pop_front() {
            *self.last.borrow_mut() = next;
        }
        let snapshot = self.last.borrow().clone();
        debug!("Simulated enumeration: {} port(s)", snapshot.len());
        Ok(snapshot)
    }
}

/// Confirms discovery steps automatically
#[derive(Debug, Default)]
pub struct SimSignal {
    steps: Vec<DiscoveryStep>,
    abort_at: Option<DiscoveryStep>,
}

impl SimSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decline when `step` is reached
    pub fn abort_at(step: DiscoveryStep) -> Self {
        Self {
            steps: Vec::new(),
            abort_at: Some(step),
        }
    }

    /// Steps confirmed so far
    pub fn steps(&self) -> &[DiscoveryStep] {
        &self.steps
    }
}

impl ConnectSignal for SimSignal {
    fn wait_for(&mut self, step: DiscoveryStep) -> Result<(), DetectError> {
        if self.abort_at == Some(step) {
            return Err(DetectError::Aborted(format!("declined at {step:?}")));
        }
        self.steps.push(step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_replays_then_repeats() {
        let ports = SimPorts::new()
            .then([PortDescriptor::bare("COM1")])
            .then([PortDescriptor::bare("COM1"), PortDescriptor::bare("COM3")]);

        assert_eq!(ports.snapshot().unwrap().len(), 1);
        assert_eq!(ports.snapshot().unwrap().len(), 2);
        assert_eq!(ports.snapshot().unwrap().len(), 2);
        assert_eq!(ports.remaining(), 0);
    }

    #[test]
    fn test_signal_abort() {
        let mut signal = SimSignal::abort_at(DiscoveryStep::Connect);
        assert!(signal.wait_for(DiscoveryStep::Disconnect).is_ok());
        assert!(signal.wait_for(DiscoveryStep::Connect).is_err());
        assert_eq!(signal.steps(), [DiscoveryStep::Disconnect]);
    }
}
