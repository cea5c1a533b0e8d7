//! Flash Plan Builder
//!
//! This crate turns a selected device family and firmware into a
//! [`FlashPlan`]: the ordered list of address/file segments and backend
//! flags a flashing attempt will use.
//!
//! # Segment order
//!
//! For esptool families the order is fixed per chip, never sorted:
//!
//! 1. firmware at the chip's primary address
//! 2. partitions at `0x8000` (ESP32 family only)
//! 3. bootloader at `0x1000` (`0x0` on ESP32-C3)
//! 4. spiffs at the address supplied by the catalog
//! 5. otadata at the address supplied by the catalog
//!
//! Optional artifacts are only included when both their URL and checksum
//! are present.
//!
//! # Example
//!
//! ```rust,no_run
//! use brew_catalog::Catalog;
//! use brew_plan::{FlashOptions, FlasherConfig, PlanBuilder};
//!
//! let catalog = Catalog::from_json("{}").unwrap();
//! let selection = catalog.find_firmware(42).unwrap();
//! let config = FlasherConfig::default();
//!
//! let plan = PlanBuilder::new(&config)
//!     .build(
//!         &selection.family,
//!         &selection.firmware,
//!         &FlashOptions {
//!             port: "/dev/ttyUSB0".into(),
//!             baud: 460800,
//!             erase_before_flash: true,
//!         },
//!     )
//!     .unwrap();
//! println!("esptool.py {}", plan.arguments().join(" "));
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod plan;
pub mod preset;
pub mod segment;

pub use address::FlashAddress;
pub use config::{FlasherConfig, HandshakeConfig, SUPPORTED_BAUD_RATES};
pub use error::ValidationError;
pub use plan::{FlashOptions, FlashPlan, PlanBuilder, RESET_AFTER, RESET_BEFORE};
pub use preset::{avr, ChipFamily, ChipPreset, FlashMethod};
pub use segment::{cache_path, ArtifactKind, FlashSegment};
