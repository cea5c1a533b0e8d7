//! Pre-flight catalog verification
//!
//! The catalog can change between the moment a user picks a firmware and
//! the moment they confirm flashing. Flashing a stale partition layout or
//! bootloader pairing can brick a board, so the selection is compared with
//! a fresh copy before anything is downloaded.

use brew_catalog::{CatalogSource, Selection};
use tracing::{debug, info};

use crate::error::FlashError;

/// Re-query the catalog and require it to match `selection`
pub fn verify_selection(
    catalog: &dyn CatalogSource,
    selection: &Selection,
) -> Result<(), FlashError> {
    info!("Verifying firmware list is up-to-date before downloading...");
    let firmware_id = selection.firmware.id;
    let stale = |reason: &str| FlashError::CatalogStale {
        firmware: firmware_id,
        reason: reason.to_string(),
    };

    let fresh = catalog
        .refresh_firmware(firmware_id)?
        .ok_or_else(|| stale("firmware was removed"))?;

    if !fresh.firmware.same_release(&selection.firmware) {
        return Err(stale("firmware release changed"));
    }
    if !fresh.family.same_boot_artifacts(&selection.family) {
        return Err(stale("device family artifacts changed"));
    }
    if fresh.family.requires_low_baud_handshake != selection.family.requires_low_baud_handshake
        || fresh.family.name != selection.family.name
    {
        return Err(stale("device family changed"));
    }

    debug!("Selection {} is current", selection.firmware);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brew_catalog::{Artifact, Catalog, CatalogError, DeviceFamily, Firmware, Project};

    struct FixedCatalog(Catalog);

    impl CatalogSource for FixedCatalog {
        fn load(&self) -> Result<Catalog, CatalogError> {
            Ok(self.0.clone())
        }
    }

    fn catalog(version: &str, boot_checksum: &str) -> Catalog {
        Catalog::new(vec![Project {
            id: 1,
            name: "Fermentrack".into(),
            families: vec![DeviceFamily {
                id: 2,
                name: "ESP32".into(),
                flash_method: "esptool".into(),
                bootloader: Some(brew_catalog::PlacedArtifact::new(
                    "https://x/boot.bin",
                    boot_checksum,
                    "",
                )),
                otadata: None,
                requires_low_baud_handshake: false,
                firmware: vec![Firmware {
                    id: 3,
                    name: "Fermentrack".into(),
                    version: version.into(),
                    family_id: 0,
                    firmware: Artifact::new("https://x/fw.bin", "f1"),
                    partitions: None,
                    spiffs: None,
                }],
            }],
        }])
        .unwrap()
    }

    #[test]
    fn test_matching_selection_passes() {
        let source = FixedCatalog(catalog("1.0", "b0"));
        let selection = source.0.find_firmware(3).unwrap();
        assert!(verify_selection(&source, &selection).is_ok());
    }

    #[test]
    fn test_new_version_is_stale() {
        let selection = catalog("1.0", "b0").find_firmware(3).unwrap();
        let source = FixedCatalog(catalog("1.1", "b0"));

        let err = verify_selection(&source, &selection).unwrap_err();
        assert!(matches!(err, FlashError::CatalogStale { firmware: 3, .. }));
    }

    #[test]
    fn test_new_bootloader_is_stale() {
        let selection = catalog("1.0", "b0").find_firmware(3).unwrap();
        let source = FixedCatalog(catalog("1.0", "b1"));

        assert!(matches!(
            verify_selection(&source, &selection),
            Err(FlashError::CatalogStale { .. })
        ));
    }

    #[test]
    fn test_removed_firmware_is_stale() {
        let selection = catalog("1.0", "b0").find_firmware(3).unwrap();
        let source = FixedCatalog(Catalog::default());

        assert!(matches!(
            verify_selection(&source, &selection),
            Err(FlashError::CatalogStale { .. })
        ));
    }
}
