//! Flasher configuration
//!
//! One immutable value handed to the plan builder and the executor when
//! they are constructed.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Baud rates the esptool backend may be driven at
pub const SUPPORTED_BAUD_RATES: [u32; 7] = [9600, 57600, 74880, 115200, 230400, 460800, 921600];

/// Low-baud pulse used to kick boards into their bootloader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeConfig {
    /// Baud rate the port is opened at
    pub baud_rate: u32,
    /// Time the port is held open
    pub settle_ms: u64,
    /// Pause before opening the port
    pub pre_delay_ms: u64,
    /// Serial timeout while the port is open
    pub timeout_ms: u64,
}

impl HandshakeConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn pre_delay(&self) -> Duration {
        Duration::from_millis(self.pre_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            baud_rate: 1200,
            settle_ms: 1500,
            pre_delay_ms: 100,
            timeout_ms: 5000,
        }
    }
}

/// Application-wide flasher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlasherConfig {
    /// Version reported to the user and in logs
    #[serde(default = "default_version")]
    pub version: String,
    /// Baud rates offered for esptool flashing
    #[serde(default = "default_bauds")]
    pub supported_bauds: Vec<u32>,
    /// Baud rate suggested first in the selection menu
    #[serde(default = "default_baud")]
    pub recommended_baud: u32,
    /// Catalog document URL or file path
    #[serde(default = "default_catalog")]
    pub catalog: String,
    /// Directory downloaded artifacts are cached in
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub handshake: HandshakeConfig,
    /// esptool executable
    #[serde(default = "default_esptool")]
    pub esptool_program: String,
    /// avrdude executable
    #[serde(default = "default_avrdude")]
    pub avrdude_program: String,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_bauds() -> Vec<u32> {
    SUPPORTED_BAUD_RATES.to_vec()
}

fn default_baud() -> u32 {
    460800
}

fn default_catalog() -> String {
    "https://www.brewflasher.com/firmware/api/catalog.json".to_string()
}

/// Platform cache directory, or the temp directory where there is none
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("brewflash")
}

fn default_esptool() -> String {
    "esptool.py".to_string()
}

fn default_avrdude() -> String {
    "avrdude".to_string()
}

impl FlasherConfig {
    pub fn is_supported_baud(&self, baud: u32) -> bool {
        self.supported_bauds.contains(&baud)
    }
}

impl Default for FlasherConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            supported_bauds: default_bauds(),
            recommended_baud: default_baud(),
            catalog: default_catalog(),
            cache_dir: default_cache_dir(),
            handshake: HandshakeConfig::default(),
            esptool_program: default_esptool(),
            avrdude_program: default_avrdude(),
        }
    }
}
