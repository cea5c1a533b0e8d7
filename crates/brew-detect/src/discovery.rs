//! New-device discovery
//!
//! The device to flash is found by comparing two port snapshots: one taken
//! while the board is unplugged and one taken after the user reports that it
//! has been plugged in. Whatever appeared in between is a candidate.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::DetectError;
use crate::scanner::{PortDescriptor, PortEnumerator, PortSnapshot};
use crate::usb_ids::device_label;

/// Ports present in `after` but not in `before`, keyed by port path.
///
/// A port that exists in both snapshots counts as unchanged even if its
/// metadata differs. Removed ports never appear in the result.
pub fn diff(before: &PortSnapshot, after: &PortSnapshot) -> Vec<PortDescriptor> {
    after
        .iter()
        .filter(|port| !before.contains(&port.port))
        .cloned()
        .collect()
}

/// A newly attached port joined against the known-device table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedDevice {
    pub descriptor: PortDescriptor,
    /// Name from the known-device table, or "Unknown"
    pub known_name: &'static str,
}

impl DetectedDevice {
    pub fn from_descriptor(descriptor: PortDescriptor) -> Self {
        let known_name = device_label(descriptor.vid, descriptor.pid);
        Self {
            descriptor,
            known_name,
        }
    }

    /// Port path to flash
    pub fn port(&self) -> &str {
        &self.descriptor.port
    }
}

impl std::fmt::Display for DetectedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Device: {}, Description: {}, Known Name: {}",
            self.descriptor.port,
            self.descriptor.description(),
            self.known_name
        )
    }
}

/// Outcome of one discovery round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Nothing appeared; retry or enter the port manually
    NoNewDevices,
    /// Exactly one new port
    Found(DetectedDevice),
    /// Several new ports; the user must pick one
    Ambiguous(Vec<DetectedDevice>),
}

impl Discovery {
    /// Classify the new ports found by a diff
    pub fn from_new_ports(ports: Vec<PortDescriptor>) -> Self {
        let mut devices: Vec<_> = ports.into_iter().map(DetectedDevice::from_descriptor).collect();
        match devices.len() {
            0 => Self::NoNewDevices,
            1 => Self::Found(devices.remove(0)),
            _ => Self::Ambiguous(devices),
        }
    }

    /// Every candidate, in port order
    pub fn candidates(&self) -> &[DetectedDevice] {
        match self {
            Self::NoNewDevices => &[],
            Self::Found(device) => std::slice::from_ref(device),
            Self::Ambiguous(devices) => devices,
        }
    }
}

/// Points at which discovery waits for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStep {
    /// Board must be unplugged before the first snapshot
    Disconnect,
    /// Board must be plugged in before the second snapshot
    Connect,
}

/// Blocks until the user confirms a discovery step
pub trait ConnectSignal {
    fn wait_for(&mut self, step: DiscoveryStep) -> Result<(), DetectError>;
}

/// Runs the disconnect/connect discovery protocol
pub struct DeviceDiscovery<E> {
    enumerator: E,
}

impl<E: PortEnumerator> DeviceDiscovery<E> {
    pub fn new(enumerator: E) -> Self {
        Self { enumerator }
    }

    /// Capture a snapshot of the current ports
    pub fn snapshot(&self) -> Result<PortSnapshot, DetectError> {
        self.enumerator.snapshot()
    }

    /// Snapshot, wait for the board to be connected, snapshot again, diff.
    pub fn discover(&self, signal: &mut dyn ConnectSignal) -> Result<Discovery, DetectError> {
        signal.wait_for(DiscoveryStep::Disconnect)?;
        let before = self.enumerator.snapshot()?;
        debug!("Cached {} port(s) before connect", before.len());

        signal.wait_for(DiscoveryStep::Connect)?;
        let after = self.enumerator.snapshot()?;

        let discovery = Discovery::from_new_ports(diff(&before, &after));
        match &discovery {
            Discovery::NoNewDevices => info!("No new devices detected"),
            Discovery::Found(device) => info!("New device detected: {}", device.port()),
            Discovery::Ambiguous(devices) => {
                info!("{} new devices detected", devices.len())
            }
        }
        Ok(discovery)
    }
}
