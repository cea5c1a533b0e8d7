//! Firmware Catalog Library
//!
//! This crate models the firmware catalog as a tree of projects, device
//! families and firmware releases, and provides the [`CatalogSource`] trait
//! used both to present selection menus and to re-verify a selection right
//! before flashing.
//!
//! # Example
//!
//! ```rust,no_run
//! use brew_catalog::{CatalogLocation, CatalogSource, JsonCatalogSource};
//!
//! let source = JsonCatalogSource::new(CatalogLocation::parse("catalog.json"));
//! let catalog = source.load().unwrap();
//!
//! for project in catalog.projects() {
//!     println!("{}", project);
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod model;
pub mod source;

pub use catalog::{Catalog, ESPTOOL_METHOD};
pub use error::CatalogError;
pub use model::{Artifact, DeviceFamily, Firmware, PlacedArtifact, Project, Selection};
pub use source::{CatalogLocation, CatalogSource, JsonCatalogSource};
