//! Flash plan builder
//!
//! [`PlanBuilder::build`] is a pure function of the catalog entries, the
//! user's options and the configuration. It performs no I/O, and the same
//! inputs always yield the same plan.

use std::path::Path;

use brew_catalog::{Artifact, DeviceFamily, Firmware, PlacedArtifact};
use serde::Serialize;
use tracing::debug;

use crate::address::FlashAddress;
use crate::config::FlasherConfig;
use crate::error::ValidationError;
use crate::preset::{avr, ChipFamily, FlashMethod};
use crate::segment::{cache_path, ArtifactKind, FlashSegment};

/// esptool reset mode before and after flashing
pub const RESET_BEFORE: &str = "default_reset";
pub const RESET_AFTER: &str = "hard_reset";

/// Options chosen by the user for one flashing attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashOptions {
    pub port: String,
    pub baud: u32,
    pub erase_before_flash: bool,
}

/// Fully resolved description of one flashing attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashPlan {
    method: FlashMethod,
    chip: &'static str,
    port: String,
    baud: u32,
    write_options: &'static [&'static str],
    segments: Vec<FlashSegment>,
    erase_before_flash: bool,
    handshake: bool,
}

impl FlashPlan {
    pub fn method(&self) -> FlashMethod {
        self.method
    }

    /// esptool chip id or avrdude part
    pub fn chip(&self) -> &str {
        self.chip
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// Segments in flashing order
    pub fn segments(&self) -> &[FlashSegment] {
        &self.segments
    }

    pub fn erase_before_flash(&self) -> bool {
        self.erase_before_flash
    }

    /// Board needs the low-baud pulse before the backend runs
    pub fn requires_handshake(&self) -> bool {
        self.handshake
    }

    /// Argument vector for the backend, program name excluded
    pub fn arguments(&self) -> Vec<String> {
        match self.method {
            FlashMethod::Esptool => self.esptool_arguments(),
            FlashMethod::Avrdude => self.avrdude_arguments(),
        }
    }

    fn esptool_arguments(&self) -> Vec<String> {
        let baud = self.baud.to_string();
        let mut args: Vec<String> = [
            "--port",
            self.port.as_str(),
            "--chip",
            self.chip,
            "--baud",
            baud.as_str(),
            "--before",
            RESET_BEFORE,
            "--after",
            RESET_AFTER,
            "write_flash",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend(self.write_options.iter().map(|s| s.to_string()));
        for segment in &self.segments {
            args.push(segment.address.to_string());
            args.push(segment.path_arg());
        }
        if self.erase_before_flash {
            args.push("--erase-all".to_string());
        }
        // esptool 3.0 changed the default flash size from detect to keep
        args.push("-fs".to_string());
        args.push("detect".to_string());
        args
    }

    fn avrdude_arguments(&self) -> Vec<String> {
        let firmware = self
            .segments
            .iter()
            .find(|s| s.kind == ArtifactKind::Firmware)
            .map(FlashSegment::path_arg)
            .unwrap_or_default();

        vec![
            "-p".to_string(),
            self.chip.to_string(),
            "-c".to_string(),
            avr::PROGRAMMER.to_string(),
            "-P".to_string(),
            self.port.clone(),
            "-D".to_string(),
            "-U".to_string(),
            format!("flash:w:{}:i", firmware),
        ]
    }
}

/// Builds [`FlashPlan`]s from catalog metadata
pub struct PlanBuilder<'a> {
    config: &'a FlasherConfig,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(config: &'a FlasherConfig) -> Self {
        Self { config }
    }

    /// Resolve the family's backend, then lay out the segments for it.
    pub fn build(
        &self,
        family: &DeviceFamily,
        firmware: &Firmware,
        options: &FlashOptions,
    ) -> Result<FlashPlan, ValidationError> {
        let method = FlashMethod::from_catalog(&family.flash_method)?;

        if firmware.family_id != family.id {
            return Err(ValidationError::FamilyMismatch {
                firmware: firmware.id,
                family: family.id,
            });
        }
        if !firmware.firmware.is_present() {
            return Err(ValidationError::MissingFirmwareImage(firmware.id));
        }
        if options.port.trim().is_empty() {
            return Err(ValidationError::MissingPort);
        }

        let plan = match method {
            FlashMethod::Esptool => self.build_esptool(family, firmware, options)?,
            FlashMethod::Avrdude => self.build_avrdude(family, firmware, options)?,
        };

        debug!(
            "Built {} plan for {} with {} segment(s)",
            plan.method,
            plan.chip,
            plan.segments.len()
        );
        Ok(plan)
    }

    fn build_esptool(
        &self,
        family: &DeviceFamily,
        firmware: &Firmware,
        options: &FlashOptions,
    ) -> Result<FlashPlan, ValidationError> {
        let chip = ChipFamily::from_family_name(&family.name)?;
        if !self.config.is_supported_baud(options.baud) {
            return Err(ValidationError::UnsupportedBaud(options.baud));
        }

        let preset = chip.preset();
        let mut segments = SegmentList::new(&self.config.cache_dir, "bin");

        segments.push(
            ArtifactKind::Firmware,
            preset.firmware_address,
            &firmware.firmware,
        )?;
        if let Some(address) = preset.partitions_address {
            if let Some(partitions) = firmware.partitions() {
                segments.push(ArtifactKind::Partitions, address, partitions)?;
            }
        }
        if let Some(address) = preset.bootloader_address {
            if let Some(bootloader) = family.bootloader() {
                segments.push(ArtifactKind::Bootloader, address, &bootloader.artifact)?;
            }
        }
        segments.push_placed(ArtifactKind::Spiffs, firmware.spiffs())?;
        segments.push_placed(ArtifactKind::Otadata, family.otadata())?;

        Ok(FlashPlan {
            method: FlashMethod::Esptool,
            chip: preset.chip,
            port: options.port.clone(),
            baud: options.baud,
            write_options: preset.write_options,
            segments: segments.finish(),
            erase_before_flash: options.erase_before_flash,
            handshake: family.requires_low_baud_handshake,
        })
    }

    /// The avrdude template is fixed: baud and erase choices do not apply.
    fn build_avrdude(
        &self,
        family: &DeviceFamily,
        firmware: &Firmware,
        options: &FlashOptions,
    ) -> Result<FlashPlan, ValidationError> {
        let mut segments = SegmentList::new(&self.config.cache_dir, "hex");
        segments.push(
            ArtifactKind::Firmware,
            FlashAddress::fixed("0x0"),
            &firmware.firmware,
        )?;

        Ok(FlashPlan {
            method: FlashMethod::Avrdude,
            chip: avr::PART,
            port: options.port.clone(),
            baud: avr::BAUD,
            write_options: &[],
            segments: segments.finish(),
            erase_before_flash: false,
            handshake: family.requires_low_baud_handshake,
        })
    }
}

/// Appends segments in call order, resolving each artifact's cache path
struct SegmentList<'a> {
    cache_dir: &'a Path,
    extension: &'static str,
    segments: Vec<FlashSegment>,
}

impl<'a> SegmentList<'a> {
    fn new(cache_dir: &'a Path, extension: &'static str) -> Self {
        Self {
            cache_dir,
            extension,
            segments: Vec::new(),
        }
    }

    fn push(
        &mut self,
        kind: ArtifactKind,
        address: FlashAddress,
        artifact: &Artifact,
    ) -> Result<(), ValidationError> {
        let path = cache_path(self.cache_dir, kind, artifact, self.extension)?;
        self.segments.push(FlashSegment {
            kind,
            address,
            path,
            source: artifact.clone(),
        });
        Ok(())
    }

    /// Push an artifact whose address comes from the catalog.
    ///
    /// A blank address (or a bare "0x") means the artifact is absent.
    fn push_placed(
        &mut self,
        kind: ArtifactKind,
        placed: Option<&PlacedArtifact>,
    ) -> Result<(), ValidationError> {
        let Some(placed) = placed else {
            return Ok(());
        };
        let raw = placed.address.trim();
        if raw.is_empty() || raw == "0x" {
            debug!("Skipping {}: no target address", kind);
            return Ok(());
        }
        let address = FlashAddress::parse(raw).ok_or_else(|| ValidationError::MalformedAddress {
            artifact: kind,
            address: placed.address.clone(),
        })?;
        self.push(kind, address, &placed.artifact)
    }

    fn finish(self) -> Vec<FlashSegment> {
        self.segments
    }
}
