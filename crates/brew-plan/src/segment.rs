//! Flash segments and the artifacts behind them

use std::fmt;
use std::path::{Path, PathBuf};

use brew_catalog::Artifact;
use serde::Serialize;

use crate::address::FlashAddress;
use crate::error::ValidationError;

/// Role of a downloadable artifact in a flash plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ArtifactKind {
    Firmware,
    Partitions,
    Bootloader,
    Spiffs,
    Otadata,
}

impl ArtifactKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Firmware => "firmware",
            Self::Partitions => "partitions",
            Self::Bootloader => "bootloader",
            Self::Spiffs => "spiffs",
            Self::Otadata => "otadata",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cache file for an artifact: `<cache_dir>/<checksum>.<extension>`.
///
/// The checksum doubles as the cache key, so it must be a plain
/// alphanumeric string.
pub fn cache_path(
    cache_dir: &Path,
    kind: ArtifactKind,
    artifact: &Artifact,
    extension: &str,
) -> Result<PathBuf, ValidationError> {
    let checksum = artifact.checksum.trim();
    if !checksum.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::MalformedChecksum {
            artifact: kind,
            checksum: artifact.checksum.clone(),
        });
    }
    Ok(cache_dir.join(format!("{}.{}", checksum.to_ascii_lowercase(), extension)))
}

/// One (address, file) pair written by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashSegment {
    pub kind: ArtifactKind,
    pub address: FlashAddress,
    /// Local cache path the artifact is downloaded to
    pub path: PathBuf,
    /// Where the file comes from and its expected checksum
    pub source: Artifact,
}

impl FlashSegment {
    pub fn path_arg(&self) -> String {
        self.path.display().to_string()
    }
}
