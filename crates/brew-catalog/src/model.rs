//! Catalog data model
//!
//! The catalog is a read-only tree of [`Project`] → [`DeviceFamily`] →
//! [`Firmware`]. Every downloadable file is an [`Artifact`] described by a
//! URL and a checksum. Entities are built once at load time and never
//! mutated afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A downloadable file identified by URL and checksum
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    /// Download URL
    #[serde(default)]
    pub url: String,
    /// Hex-encoded SHA-256 of the file contents
    #[serde(default)]
    pub checksum: String,
}

impl Artifact {
    pub fn new(url: impl Into<String>, checksum: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            checksum: checksum.into(),
        }
    }

    /// An artifact only exists when both its URL and checksum are set.
    ///
    /// A URL without a checksum (or the reverse) counts as absent.
    pub fn is_present(&self) -> bool {
        !self.url.trim().is_empty() && !self.checksum.trim().is_empty()
    }
}

/// An artifact that is written at a catalog-supplied flash address
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedArtifact {
    #[serde(flatten)]
    pub artifact: Artifact,
    /// Target address as delivered by the catalog (e.g. "0x290000")
    #[serde(default)]
    pub address: String,
}

impl PlacedArtifact {
    pub fn new(
        url: impl Into<String>,
        checksum: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            artifact: Artifact::new(url, checksum),
            address: address.into(),
        }
    }
}

/// A firmware project (e.g. "Fermentrack", "BrewPi-ESP")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub name: String,
    /// Device families in display order
    #[serde(default)]
    pub families: Vec<DeviceFamily>,
}

impl Project {
    /// Look up a device family by id
    pub fn family(&self, family_id: u32) -> Option<&DeviceFamily> {
        self.families.iter().find(|f| f.id == family_id)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A family of boards sharing a chip, flash method and boot artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFamily {
    pub id: u32,
    /// Display name, also used to select the chip preset (e.g. "ESP32-S2")
    pub name: String,
    /// Flashing backend identifier as delivered by the catalog
    /// ("esptool" or "avrdude")
    pub flash_method: String,
    #[serde(default)]
    pub bootloader: Option<PlacedArtifact>,
    #[serde(default)]
    pub otadata: Option<PlacedArtifact>,
    /// Board must be pulsed at a low baud rate to enter its bootloader
    #[serde(default, alias = "use_1200_bps_touch")]
    pub requires_low_baud_handshake: bool,
    /// Firmware entries in display order
    #[serde(default)]
    pub firmware: Vec<Firmware>,
}

impl DeviceFamily {
    /// Bootloader artifact, if present per the checksum gate
    pub fn bootloader(&self) -> Option<&PlacedArtifact> {
        self.bootloader.as_ref().filter(|a| a.artifact.is_present())
    }

    /// OTA data artifact, if present per the checksum gate
    pub fn otadata(&self) -> Option<&PlacedArtifact> {
        self.otadata.as_ref().filter(|a| a.artifact.is_present())
    }

    /// Compares the boot artifacts two copies of a family would flash.
    pub fn same_boot_artifacts(&self, other: &DeviceFamily) -> bool {
        self.id == other.id
            && self.flash_method == other.flash_method
            && self.bootloader() == other.bootloader()
            && self.otadata() == other.otadata()
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A flashable firmware release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firmware {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Owning device family. Filled in from the tree when the catalog loads.
    #[serde(default)]
    pub family_id: u32,
    /// Application image, always required
    pub firmware: Artifact,
    #[serde(default)]
    pub partitions: Option<Artifact>,
    #[serde(default)]
    pub spiffs: Option<PlacedArtifact>,
}

impl Firmware {
    /// Partition table artifact, if present per the checksum gate
    pub fn partitions(&self) -> Option<&Artifact> {
        self.partitions.as_ref().filter(|a| a.is_present())
    }

    /// Filesystem image artifact, if present per the checksum gate
    pub fn spiffs(&self) -> Option<&PlacedArtifact> {
        self.spiffs.as_ref().filter(|a| a.artifact.is_present())
    }

    /// True if `other` describes the same release with the same artifacts
    pub fn same_release(&self, other: &Firmware) -> bool {
        self.id == other.id
            && self.family_id == other.family_id
            && self.version == other.version
            && self.firmware == other.firmware
            && self.partitions() == other.partitions()
            && self.spiffs() == other.spiffs()
    }
}

impl fmt::Display for Firmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} v{}", self.name, self.version)
        }
    }
}

/// A firmware together with the family it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub family: DeviceFamily,
    pub firmware: Firmware,
}
