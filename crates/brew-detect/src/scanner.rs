//! Serial port scanner
//!
//! This module captures snapshots of the currently enumerated serial ports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serialport::{available_ports, SerialPortType};
use tracing::{debug, info};

use crate::error::DetectError;

/// Information about a serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB serial number (if available)
    pub serial_number: Option<String>,
    /// USB manufacturer string
    pub manufacturer: Option<String>,
    /// USB product string
    pub product: Option<String>,
}

impl PortDescriptor {
    /// A port with no USB metadata
    pub fn bare(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            vid: None,
            pid: None,
            serial_number: None,
            manufacturer: None,
            product: None,
        }
    }

    /// A USB port with the given VID/PID
    pub fn usb(port: impl Into<String>, vid: u16, pid: u16) -> Self {
        Self {
            vid: Some(vid),
            pid: Some(pid),
            ..Self::bare(port)
        }
    }

    /// Human readable description of the port hardware
    pub fn description(&self) -> &str {
        self.product
            .as_deref()
            .or(self.manufacturer.as_deref())
            .unwrap_or("n/a")
    }

    /// Create from serialport crate's port info
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                serial_number: usb.serial_number.clone(),
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
            },
            _ => Self::bare(name),
        }
    }
}

/// All serial ports present at one instant, keyed by port path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSnapshot {
    ports: BTreeMap<String, PortDescriptor>,
}

impl PortSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    pub fn get(&self, port: &str) -> Option<&PortDescriptor> {
        self.ports.get(port)
    }

    /// Ports ordered by path
    pub fn iter(&self) -> impl Iterator<Item = &PortDescriptor> {
        self.ports.values()
    }
}

impl FromIterator<PortDescriptor> for PortSnapshot {
    /// Later descriptors for the same path replace earlier ones.
    fn from_iter<I: IntoIterator<Item = PortDescriptor>>(iter: I) -> Self {
        Self {
            ports: iter.into_iter().map(|p| (p.port.clone(), p)).collect(),
        }
    }
}

/// Source of serial port snapshots
pub trait PortEnumerator {
    fn snapshot(&self) -> Result<PortSnapshot, DetectError>;
}

impl<T: PortEnumerator + ?Sized> PortEnumerator for &T {
    fn snapshot(&self) -> Result<PortSnapshot, DetectError> {
        (**self).snapshot()
    }
}

/// Serial port scanner configuration
#[derive(Debug, Clone)]
struct ScannerConfig {
    /// Skip ports matching these patterns
    skip_patterns: Vec<String>,
}

/// Enumerates the ports of the running system
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    /// Create a new scanner with default configuration
    pub fn new() -> Self {
        Self {
            config: ScannerConfig {
                skip_patterns: vec![
                    // Bluetooth ports on macOS
                    "Bluetooth".to_string(),
                    // Debug/logging ports
                    "debug".to_string(),
                ],
            },
        }
    }

    /// Check if a port should be skipped
    fn should_skip_port(&self, port: &PortDescriptor) -> bool {
        self.config
            .skip_patterns
            .iter()
            .any(|pattern| port.port.contains(pattern.as_str()))
    }
}

impl PortEnumerator for PortScanner {
    fn snapshot(&self) -> Result<PortSnapshot, DetectError> {
        debug!("Enumerating serial ports...");
        let ports =
            available_ports().map_err(|e| DetectError::EnumerationFailed(e.to_string()))?;

        let snapshot: PortSnapshot = ports
            .into_iter()
            .map(|p| PortDescriptor::from_serialport(p.port_name, &p.port_type))
            .filter(|p| !self.should_skip_port(p))
            .collect();

        info!("Found {} serial port(s)", snapshot.len());
        for port in snapshot.iter() {
            debug!("  {} - {}", port.port, port.description());
        }

        Ok(snapshot)
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}
