//! Sample catalog with matching artifact bytes

use brew_catalog::{
    Artifact, Catalog, CatalogError, DeviceFamily, Firmware, PlacedArtifact, Project,
};
use brew_flash::sha256_hex;

use crate::fetcher::SimFetcher;

/// Firmware ids in the sample catalog
pub mod ids {
    pub const ESP32_FERMENTRACK: u32 = 101;
    pub const ESP32_S2_TILTBRIDGE: u32 = 102;
    pub const ESP32_C3_TILTBRIDGE: u32 = 103;
    pub const ESP8266_BREWPI: u32 = 104;
    pub const ARDUINO_BREWPI: u32 = 105;
    pub const LEONARDO_BREWPI: u32 = 106;
}

/// Builds the sample catalog and serves its artifacts
#[derive(Debug, Default)]
pub struct SampleCatalog {
    fetcher: SimFetcher,
}

impl SampleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher serving every artifact referenced by [`SampleCatalog::catalog`]
    pub fn fetcher(&self) -> SimFetcher {
        self.fetcher.clone()
    }

    fn artifact(&self, name: &str) -> Artifact {
        let url = format!("sim://artifacts/{name}");
        let bytes = format!("{name} image").into_bytes();
        let checksum = sha256_hex(&bytes);
        self.fetcher.serve(url.clone(), bytes);
        Artifact::new(url, checksum)
    }

    fn placed(&self, name: &str, address: &str) -> PlacedArtifact {
        PlacedArtifact {
            artifact: self.artifact(name),
            address: address.to_string(),
        }
    }

    fn firmware(&self, id: u32, name: &str, version: &str, image: &str) -> Firmware {
        Firmware {
            id,
            name: name.to_string(),
            version: version.to_string(),
            family_id: 0,
            firmware: self.artifact(image),
            partitions: None,
            spiffs: None,
        }
    }

    fn family(
        &self,
        id: u32,
        name: &str,
        flash_method: &str,
        firmware: Vec<Firmware>,
    ) -> DeviceFamily {
        DeviceFamily {
            id,
            name: name.to_string(),
            flash_method: flash_method.to_string(),
            bootloader: None,
            otadata: None,
            requires_low_baud_handshake: false,
            firmware,
        }
    }

    /// Two projects spanning every chip family and both flash methods
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        let mut fermentrack = self.firmware(
            ids::ESP32_FERMENTRACK,
            "Fermentrack",
            "0.9.2",
            "fermentrack-esp32.bin",
        );
        fermentrack.partitions = Some(self.artifact("partitions-esp32.bin"));
        fermentrack.spiffs = Some(self.placed("spiffs-esp32.bin", "0x390000"));

        let mut esp32 = self.family(1, "ESP32", "esptool", vec![fermentrack]);
        esp32.bootloader = Some(self.placed("bootloader-esp32.bin", ""));
        esp32.otadata = Some(self.placed("otadata-esp32.bin", "0xe000"));

        let mut tiltbridge_s2 = self.firmware(
            ids::ESP32_S2_TILTBRIDGE,
            "TiltBridge",
            "1.2.0",
            "tiltbridge-s2.bin",
        );
        tiltbridge_s2.partitions = Some(self.artifact("partitions-s2.bin"));
        let mut esp32_s2 = self.family(2, "ESP32-S2", "esptool", vec![tiltbridge_s2]);
        esp32_s2.bootloader = Some(self.placed("bootloader-s2.bin", ""));
        esp32_s2.requires_low_baud_handshake = true;

        let mut tiltbridge_c3 = self.firmware(
            ids::ESP32_C3_TILTBRIDGE,
            "TiltBridge",
            "1.2.0",
            "tiltbridge-c3.bin",
        );
        tiltbridge_c3.partitions = Some(self.artifact("partitions-c3.bin"));
        let mut esp32_c3 = self.family(3, "ESP32-C3", "esptool", vec![tiltbridge_c3]);
        esp32_c3.bootloader = Some(self.placed("bootloader-c3.bin", ""));

        let esp8266 = self.family(
            4,
            "ESP8266",
            "esptool",
            vec![self.firmware(
                ids::ESP8266_BREWPI,
                "BrewPi-ESP8266",
                "0.11",
                "brewpi-esp8266.bin",
            )],
        );
        let arduino = self.family(
            5,
            "Arduino",
            "avrdude",
            vec![self.firmware(ids::ARDUINO_BREWPI, "BrewPi", "0.2.11", "brewpi-uno.hex")],
        );
        let mut leonardo = self.family(
            6,
            "Arduino Leonardo",
            "avrdude",
            vec![self.firmware(ids::LEONARDO_BREWPI, "BrewPi", "0.2.11", "brewpi-leonardo.hex")],
        );
        leonardo.requires_low_baud_handshake = true;

        Catalog::new(vec![
            Project {
                id: 1,
                name: "Fermentrack".to_string(),
                families: vec![esp32, esp32_s2, esp32_c3],
            },
            Project {
                id: 2,
                name: "BrewPi".to_string(),
                families: vec![esp8266, arduino, leonardo],
            },
        ])
    }
}
