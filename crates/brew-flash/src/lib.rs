//! Flash Executor Library
//!
//! This crate runs a [`brew_plan::FlashPlan`] against a device: it checks
//! that the backend is installed, re-verifies the selection against the
//! catalog, downloads and checksums every artifact, performs the optional
//! low-baud handshake and finally invokes the backend.
//!
//! All collaborators sit behind traits ([`ArtifactFetcher`],
//! [`HandshakePort`], [`FlashBackend`], [`brew_catalog::CatalogSource`]) so
//! the pipeline can be exercised without hardware.

pub mod backend;
pub mod cache;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod handshake;
pub mod verify;

pub use backend::{
    find_program, is_serial_failure, Backends, CommandBackend, FlashBackend, AVRDUDE_REMEDIATION,
    ESPTOOL_REMEDIATION,
};
pub use cache::{sha256_hex, ArtifactCache};
pub use error::{
    BackendError, FlashError, HANDSHAKE_REMEDIATION, MANUAL_FLASH_HINT, RETRY_HINT,
};
pub use executor::{ExecutorState, FlashExecutor, FlashReport};
pub use fetch::{ArtifactFetcher, HttpFetcher};
pub use handshake::{HandshakePort, SerialHandshake};
pub use verify::verify_selection;
