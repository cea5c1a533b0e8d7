//! Flash executor state machine
//!
//! ```text
//! Idle → Verifying → Downloading → (HandshakePulse) → Invoking → Done
//!   └──────────┴────────────┴──────────────┴──────────────┴──→ Failed
//! ```
//!
//! Every attempt runs strictly in sequence on the calling thread. Nothing is
//! retried: a failure in any state ends the attempt. Downloaded artifacts
//! are evicted once the attempt ends, whatever the outcome.

use std::fmt;

use brew_catalog::{CatalogSource, Selection};
use brew_plan::{FlashMethod, FlashPlan, FlasherConfig};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::backend::Backends;
use crate::cache::ArtifactCache;
use crate::error::{
    BackendError, FlashError, HANDSHAKE_REMEDIATION, MANUAL_FLASH_HINT, RETRY_HINT,
};
use crate::fetch::ArtifactFetcher;
use crate::handshake::HandshakePort;
use crate::verify::verify_selection;

/// Executor states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutorState {
    Idle,
    Verifying,
    Downloading,
    HandshakePulse,
    Invoking,
    Done,
    Failed,
}

impl ExecutorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Verifying => "verifying",
            Self::Downloading => "downloading",
            Self::HandshakePulse => "handshake",
            Self::Invoking => "invoking",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a successful attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashReport {
    pub method: FlashMethod,
    pub port: String,
    /// Segments handed to the backend
    pub segments: usize,
    /// Artifact files deleted after the attempt
    pub evicted: usize,
}

/// Runs one flashing attempt
pub struct FlashExecutor<'a> {
    config: &'a FlasherConfig,
    catalog: &'a dyn CatalogSource,
    fetcher: &'a dyn ArtifactFetcher,
    handshake: &'a dyn HandshakePort,
    backends: Backends,
    state: ExecutorState,
    history: Vec<ExecutorState>,
}

impl<'a> FlashExecutor<'a> {
    pub fn new(
        config: &'a FlasherConfig,
        catalog: &'a dyn CatalogSource,
        fetcher: &'a dyn ArtifactFetcher,
        handshake: &'a dyn HandshakePort,
        backends: Backends,
    ) -> Self {
        Self {
            config,
            catalog,
            fetcher,
            handshake,
            backends,
            state: ExecutorState::Idle,
            history: vec![ExecutorState::Idle],
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[ExecutorState] {
        &self.history
    }

    /// Flash `plan`, built from `selection`, onto the device.
    ///
    /// An executor runs a single attempt; construct a new one to retry.
    /// Running it again fails with [`FlashError::AlreadyRan`] and touches nothing.
    pub fn run(
        &mut self,
        selection: &Selection,
        plan: &FlashPlan,
    ) -> Result<FlashReport, FlashError> {
        if self.state != ExecutorState::Idle {
            return Err(FlashError::AlreadyRan { state: self.state });
        }

        let mut cache = ArtifactCache::new(&self.config.cache_dir);
        let result = self.execute(selection, plan, &mut cache);

        let evicted = cache.evict();
        if evicted > 0 {
            debug!("Removed {} downloaded artifact(s)", evicted);
        }

        match result {
            Ok(()) => {
                self.enter(ExecutorState::Done);
                info!(
                    "Firmware successfully flashed. \
                     Reset device to switch back to normal boot mode."
                );
                Ok(FlashReport {
                    method: plan.method(),
                    port: plan.port().to_string(),
                    segments: plan.segments().len(),
                    evicted,
                })
            }
            Err(e) => {
                error!("Flashing failed during {}: {}", self.state, e);
                self.enter(ExecutorState::Failed);
                Err(e)
            }
        }
    }

    fn execute(
        &mut self,
        selection: &Selection,
        plan: &FlashPlan,
        cache: &mut ArtifactCache,
    ) -> Result<(), FlashError> {
        self.backends.get(plan.method()).ensure_available()?;

        self.enter(ExecutorState::Verifying);
        verify_selection(self.catalog, selection)?;

        self.enter(ExecutorState::Downloading);
        info!("Downloading firmware...");
        for segment in plan.segments() {
            cache.download(self.fetcher, segment)?;
        }
        info!("Downloaded successfully!");

        if plan.requires_handshake() {
            self.enter(ExecutorState::HandshakePulse);
            let handshake = &self.config.handshake;
            self.handshake
                .pulse(plan.port(), handshake)
                .map_err(|e| FlashError::Handshake {
                    port: plan.port().to_string(),
                    baud: handshake.baud_rate,
                    reason: e.to_string(),
                    remediation: HANDSHAKE_REMEDIATION,
                })?;
        }

        self.enter(ExecutorState::Invoking);
        let backend = self.backends.get_mut(plan.method());
        let tool = backend.tool().to_string();
        match backend.invoke(&plan.arguments()) {
            Ok(()) => Ok(()),
            Err(BackendError::Serial(reason)) => Err(FlashError::BackendSerial { tool, reason }),
            Err(BackendError::Failed(reason)) => {
                let mut hints = vec![RETRY_HINT];
                if plan.requires_handshake() {
                    hints.push(MANUAL_FLASH_HINT);
                }
                Err(FlashError::BackendInvocation {
                    tool,
                    reason,
                    hints,
                })
            }
        }
    }

    fn enter(&mut self, state: ExecutorState) {
        debug!("Executor: {} -> {}", self.state, state);
        self.state = state;
        self.history.push(state);
    }
}
