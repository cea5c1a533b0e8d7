//! Error types for flash plan validation

use thiserror::Error;

use crate::segment::ArtifactKind;

/// Reasons a flash plan cannot be built. Always reported before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Catalog names a backend this tool does not know
    #[error("invalid flash method '{0}', update brewflash and try again")]
    UnknownFlashMethod(String),

    /// Catalog names a chip family with no preset
    #[error("invalid device family '{0}', relaunch brewflash and try again")]
    UnknownFamily(String),

    /// Firmware does not belong to the supplied family
    #[error("firmware {firmware} does not belong to device family {family}")]
    FamilyMismatch { firmware: u32, family: u32 },

    /// The application image is missing its URL or checksum
    #[error("firmware {0} has no downloadable image")]
    MissingFirmwareImage(u32),

    /// Baud rate not in the configured set
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),

    /// Catalog address is not a `0x` hexadecimal literal
    #[error("malformed {artifact} address '{address}'")]
    MalformedAddress {
        artifact: ArtifactKind,
        address: String,
    },

    /// Checksum cannot be used as a cache key
    #[error("malformed {artifact} checksum '{checksum}'")]
    MalformedChecksum {
        artifact: ArtifactKind,
        checksum: String,
    },

    /// No serial port selected
    #[error("no serial port selected")]
    MissingPort,

    /// Both --erase-flash and --dont-erase-flash were given
    #[error("can't specify both --erase-flash and --dont-erase-flash")]
    ConflictingEraseFlags,
}
