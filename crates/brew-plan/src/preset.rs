//! Backend and chip presets
//!
//! Catalog strings are resolved into these closed enums exactly once, when
//! a plan is built. Everything downstream matches on them exhaustively.

use std::fmt;

use serde::Serialize;

use crate::address::FlashAddress;
use crate::error::ValidationError;

/// Flashing backend used for a device family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlashMethod {
    /// Library-style ESP flashing
    Esptool,
    /// Programmer-style AVR flashing
    Avrdude,
}

impl FlashMethod {
    /// Resolve the catalog's `flash_method` string
    pub fn from_catalog(method: &str) -> Result<Self, ValidationError> {
        match method.trim() {
            "esptool" => Ok(Self::Esptool),
            "avrdude" => Ok(Self::Avrdude),
            other => Err(ValidationError::UnknownFlashMethod(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Esptool => "esptool",
            Self::Avrdude => "avrdude",
        }
    }
}

impl fmt::Display for FlashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ESP chip families esptool can flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChipFamily {
    Esp32,
    Esp32S2,
    Esp32C3,
    Esp8266,
}

/// Fixed flashing parameters for one chip family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipPreset {
    /// esptool `--chip` value
    pub chip: &'static str,
    /// Options following `write_flash`
    pub write_options: &'static [&'static str],
    /// Where the application image goes
    pub firmware_address: FlashAddress,
    /// Partition table address, if the chip uses one
    pub partitions_address: Option<FlashAddress>,
    /// Second stage bootloader address, if the chip uses one
    pub bootloader_address: Option<FlashAddress>,
}

const COMPRESSED_DIO_80M: &[&str] = &["-z", "--flash_mode", "dio", "--flash_freq", "80m"];

impl ChipFamily {
    pub const ALL: [ChipFamily; 4] = [Self::Esp32, Self::Esp32S2, Self::Esp32C3, Self::Esp8266];

    /// Resolve a catalog family name such as "ESP32-S2"
    pub fn from_family_name(name: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|chip| chip.family_name() == name.trim())
            .ok_or_else(|| ValidationError::UnknownFamily(name.to_string()))
    }

    /// Family name as it appears in the catalog
    pub fn family_name(&self) -> &'static str {
        match self {
            Self::Esp32 => "ESP32",
            Self::Esp32S2 => "ESP32-S2",
            Self::Esp32C3 => "ESP32-C3",
            Self::Esp8266 => "ESP8266",
        }
    }

    pub fn preset(&self) -> ChipPreset {
        match self {
            Self::Esp32 => ChipPreset {
                chip: "esp32",
                write_options: &[],
                firmware_address: FlashAddress::fixed("0x10000"),
                partitions_address: Some(FlashAddress::fixed("0x8000")),
                bootloader_address: Some(FlashAddress::fixed("0x1000")),
            },
            Self::Esp32S2 => ChipPreset {
                chip: "esp32s2",
                write_options: COMPRESSED_DIO_80M,
                firmware_address: FlashAddress::fixed("0x10000"),
                partitions_address: Some(FlashAddress::fixed("0x8000")),
                bootloader_address: Some(FlashAddress::fixed("0x1000")),
            },
            // The C3 ROM loads its bootloader from the start of flash
            Self::Esp32C3 => ChipPreset {
                chip: "esp32c3",
                write_options: COMPRESSED_DIO_80M,
                firmware_address: FlashAddress::fixed("0x10000"),
                partitions_address: Some(FlashAddress::fixed("0x8000")),
                bootloader_address: Some(FlashAddress::fixed("0x0")),
            },
            Self::Esp8266 => ChipPreset {
                chip: "esp8266",
                write_options: &[],
                firmware_address: FlashAddress::fixed("0x00000"),
                partitions_address: None,
                bootloader_address: None,
            },
        }
    }
}

/// avrdude part and programmer
pub mod avr {
    pub const PART: &str = "atmega328p";
    pub const PROGRAMMER: &str = "arduino";
    /// Baud the arduino programmer talks at; not user selectable
    pub const BAUD: u32 = 115200;
}
