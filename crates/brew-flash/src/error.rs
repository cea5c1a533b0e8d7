//! Error types for flashing attempts

use std::path::PathBuf;

use brew_catalog::CatalogError;
use brew_plan::{ArtifactKind, ValidationError};
use thiserror::Error;

use crate::executor::ExecutorState;

/// Guidance shown when the low-baud handshake fails
pub const HANDSHAKE_REMEDIATION: &str = "Ensure the correct serial port is selected and try again, \
or set the device into 'flash' mode manually. \
Instructions: http://www.brewflasher.com/manualflash/";

/// Guidance shown after a failed backend run
pub const RETRY_HINT: &str = "Try flashing again, or try flashing with a slower speed.";

/// Extra guidance for boards that need a handshake to enter the bootloader
pub const MANUAL_FLASH_HINT: &str = "You may need to manually set the device into 'flash' mode. \
Instructions: http://www.brewflasher.com/manualflash/";

/// Errors reported by a flashing backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend could not talk to the device over the serial port
    #[error("serial communication error: {0}")]
    Serial(String),

    /// Any other backend failure
    #[error("{0}")]
    Failed(String),
}

/// Errors that end a flashing attempt
#[derive(Debug, Error)]
pub enum FlashError {
    /// Plan could not be built; nothing was touched
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Catalog could not be re-queried
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The selection no longer matches the catalog
    #[error("firmware list is not up to date ({reason}), relaunch and try again")]
    CatalogStale { firmware: u32, reason: String },

    /// Artifact could not be fetched or stored
    #[error("unable to download {artifact} from {url}: {reason}")]
    Download {
        artifact: ArtifactKind,
        url: String,
        reason: String,
    },

    /// Fetched artifact does not hash to the catalog checksum
    #[error("checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: ArtifactKind,
        expected: String,
        actual: String,
    },

    /// The low-baud pulse could not be performed
    #[error("unable to perform {baud} bps touch on {port}: {reason}")]
    Handshake {
        port: String,
        baud: u32,
        reason: String,
        remediation: &'static str,
    },

    /// Backend lost or never had serial contact with the device
    #[error("{tool} serial error: {reason}")]
    BackendSerial { tool: String, reason: String },

    /// Backend ran and reported failure
    #[error("firmware flashing FAILED, {tool} raised an error: {reason}")]
    BackendInvocation {
        tool: String,
        reason: String,
        hints: Vec<&'static str>,
    },

    /// Backend executable is not installed
    #[error("{tool} not found on the path")]
    MissingToolchain {
        tool: String,
        remediation: &'static str,
    },

    /// Cache directory problem
    #[error("cache error at {path}: {reason}")]
    Cache { path: PathBuf, reason: String },

    /// The executor already ran an attempt
    #[error("executor already ran (state: {state}), start a new attempt to retry")]
    AlreadyRan { state: ExecutorState },
}

impl FlashError {
    /// A failed backend run may be retried by starting a new session;
    /// everything else aborts the process.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::BackendInvocation { .. })
    }

    /// Structured guidance attached to the error, if any
    pub fn remediation(&self) -> Vec<&'static str> {
        match self {
            Self::Handshake { remediation, .. } | Self::MissingToolchain { remediation, .. } => {
                vec![*remediation]
            }
            Self::BackendInvocation { hints, .. } => hints.clone(),
            _ => Vec::new(),
        }
    }
}
