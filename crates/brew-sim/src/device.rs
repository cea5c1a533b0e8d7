//! Simulated device-facing collaborators

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use brew_flash::{BackendError, FlashBackend, FlashError, HandshakePort};
use brew_plan::HandshakeConfig;
use serialport::ErrorKind;
use tracing::debug;

/// Records handshake pulses and optionally fails them
#[derive(Debug, Clone, Default)]
pub struct SimHandshake {
    pulses: Rc<RefCell<Vec<(String, u32)>>>,
    fail: Rc<Cell<bool>>,
}

impl SimHandshake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handshake that fails as if the port vanished
    pub fn failing() -> Self {
        let sim = Self::default();
        sim.fail.set(true);
        sim
    }

    /// Ports pulsed so far, with the baud rate used
    pub fn pulses(&self) -> Vec<(String, u32)> {
        self.pulses.borrow().clone()
    }
}

impl HandshakePort for SimHandshake {
    fn pulse(&self, port: &str, config: &HandshakeConfig) -> Result<(), serialport::Error> {
        self.pulses
            .borrow_mut()
            .push((port.to_string(), config.baud_rate));
        if self.fail.get() {
            return Err(serialport::Error::new(
                ErrorKind::NoDevice,
                format!("could not open port {port}"),
            ));
        }
        Ok(())
    }
}

/// Scripted result of a backend run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimOutcome {
    Success,
    SerialError(String),
    Failure(String),
}

#[derive(Debug)]
struct BackendState {
    installed: bool,
    outcome: SimOutcome,
    invocations: Vec<Vec<String>>,
}

/// Backend that records its argument vectors instead of flashing
///
/// Clones share state, so one clone can be boxed into
/// [`brew_flash::Backends`] while the test keeps another.
#[derive(Debug, Clone)]
pub struct SimBackend {
    tool: String,
    state: Rc<RefCell<BackendState>>,
}

impl SimBackend {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            state: Rc::new(RefCell::new(BackendState {
                installed: true,
                outcome: SimOutcome::Success,
                invocations: Vec::new(),
            })),
        }
    }

    pub fn with_outcome(self, outcome: SimOutcome) -> Self {
        self.state.borrow_mut().outcome = outcome;
        self
    }

    /// Report the tool as missing from the system
    pub fn uninstalled(self) -> Self {
        self.state.borrow_mut().installed = false;
        self
    }

    /// Argument vectors received so far
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.state.borrow().invocations.clone()
    }

    pub fn invoked(&self) -> bool {
        !self.state.borrow().invocations.is_empty()
    }

    pub fn boxed(&self) -> Box<dyn FlashBackend> {
        Box::new(self.clone())
    }
}

impl FlashBackend for SimBackend {
    fn tool(&self) -> &str {
        &self.tool
    }

    fn ensure_available(&self) -> Result<(), FlashError> {
        if self.state.borrow().installed {
            Ok(())
        } else {
            Err(FlashError::MissingToolchain {
                tool: self.tool.clone(),
                remediation: "install the simulated tool",
            })
        }
    }

    fn invoke(&mut self, args: &[String]) -> Result<(), BackendError> {
        debug!("{} invoked with {} argument(s)", self.tool, args.len());
        let mut state = self.state.borrow_mut();
        state.invocations.push(args.to_vec());
        match &state.outcome {
            SimOutcome::Success => Ok(()),
            SimOutcome::SerialError(reason) => Err(BackendError::Serial(reason.clone())),
            SimOutcome::Failure(reason) => Err(BackendError::Failed(reason.clone())),
        }
    }
}
