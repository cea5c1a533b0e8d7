//! Serial Device Discovery Library
//!
//! This crate provides serial port snapshots and the snapshot/diff protocol
//! used to work out which port a freshly connected board occupies.
//!
//! # Example
//!
//! ```rust,no_run
//! use brew_detect::{PortEnumerator, PortScanner};
//!
//! let scanner = PortScanner::new();
//! let snapshot = scanner.snapshot().unwrap();
//!
//! for port in snapshot.iter() {
//!     println!("Found port: {}", port.port);
//! }
//! ```

pub mod discovery;
pub mod error;
pub mod scanner;
pub mod usb_ids;

pub use discovery::{
    diff, ConnectSignal, DetectedDevice, DeviceDiscovery, Discovery, DiscoveryStep,
};
pub use error::DetectError;
pub use scanner::{PortDescriptor, PortEnumerator, PortScanner, PortSnapshot};
pub use usb_ids::{device_label, known_device_name, UNKNOWN_DEVICE};
