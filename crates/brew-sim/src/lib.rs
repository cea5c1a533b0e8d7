//! Flashing Simulation Library
//!
//! This crate provides stand-ins for everything the flashing pipeline talks
//! to, so discovery, planning and execution can be tested without boards,
//! serial adapters, network access or installed tools:
//!
//! - **SimCatalog**: In-memory catalog that can change between queries
//! - **SimFetcher**: Serves artifact bytes by URL, optionally corrupted
//! - **SimPorts** / **SimSignal**: Scripted port snapshots and discovery prompts
//! - **SimHandshake** / **SimBackend**: Record device interaction
//! - **SampleCatalog**: A catalog covering every chip family, with artifacts
//!
//! # Example
//!
//! ```rust
//! use brew_sim::{fixture::ids, SampleCatalog, SimCatalog};
//! use brew_catalog::CatalogSource;
//!
//! let sample = SampleCatalog::new();
//! let catalog = SimCatalog::new(sample.catalog().unwrap());
//!
//! let selection = catalog.refresh_firmware(ids::ESP32_S2_TILTBRIDGE).unwrap().unwrap();
//! assert_eq!(selection.family.name, "ESP32-S2");
//! ```

pub mod catalog;
pub mod device;
pub mod fetcher;
pub mod fixture;
pub mod ports;

pub use catalog::SimCatalog;
pub use device::{SimBackend, SimHandshake, SimOutcome};
pub use fetcher::SimFetcher;
pub use fixture::SampleCatalog;
pub use ports::{SimPorts, SimSignal};
