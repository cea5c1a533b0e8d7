//! Error types for device discovery

use thiserror::Error;

/// Errors that can occur during discovery
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// The user signal between snapshots could not be obtained
    #[error("discovery aborted: {0}")]
    Aborted(String),
}
