//! Catalog sources
//!
//! A [`CatalogSource`] is queried twice per session: once to present the
//! menus, and again right before flashing to make sure the selection has not
//! gone stale in the meantime.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::model::Selection;

/// Anything that can produce the current firmware catalog
pub trait CatalogSource {
    /// Load the full catalog
    fn load(&self) -> Result<Catalog, CatalogError>;

    /// Re-query the freshest copy of a single firmware and its family.
    ///
    /// Returns `Ok(None)` if the firmware no longer exists.
    fn refresh_firmware(&self, firmware_id: u32) -> Result<Option<Selection>, CatalogError> {
        Ok(self.load()?.find_firmware(firmware_id))
    }
}

/// Where a JSON catalog document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLocation {
    /// HTTP(S) URL
    Url(String),
    /// Local file
    File(PathBuf),
}

impl CatalogLocation {
    /// Interpret a user-supplied string as a URL or a file path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for CatalogLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Catalog backed by a JSON document
#[derive(Debug, Clone)]
pub struct JsonCatalogSource {
    location: CatalogLocation,
    esptool_only: bool,
}

impl JsonCatalogSource {
    pub fn new(location: CatalogLocation) -> Self {
        Self {
            location,
            esptool_only: false,
        }
    }

    /// Only keep families flashed through esptool
    pub fn esptool_only(mut self, esptool_only: bool) -> Self {
        self.esptool_only = esptool_only;
        self
    }

    fn read_document(&self) -> Result<String, CatalogError> {
        let failed = |reason: String| CatalogError::FetchFailed {
            location: self.location.to_string(),
            reason,
        };

        match &self.location {
            CatalogLocation::Url(url) => {
                debug!("GET {}", url);
                reqwest::blocking::Client::new()
                    .get(url)
                    .send()
                    .and_then(|r| r.error_for_status())
                    .and_then(|r| r.text())
                    .map_err(|e| failed(e.to_string()))
            }
            CatalogLocation::File(path) => {
                std::fs::read_to_string(path).map_err(|e| failed(e.to_string()))
            }
        }
    }
}

impl CatalogSource for JsonCatalogSource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        info!("Loading firmware catalog from {}", self.location);
        let catalog = Catalog::from_json(&self.read_document()?)?;
        Ok(if self.esptool_only {
            catalog.esptool_only()
        } else {
            catalog
        })
    }
}
