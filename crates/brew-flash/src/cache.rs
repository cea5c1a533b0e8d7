//! Checksum-keyed artifact cache
//!
//! Artifacts are streamed into a temporary file inside the cache directory
//! while being hashed. The file is only moved to its checksum-keyed path
//! once the SHA-256 matches the catalog, so a path named after a checksum
//! always holds bytes with that checksum.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use brew_plan::FlashSegment;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::FlashError;
use crate::fetch::ArtifactFetcher;

/// Hex-encoded SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Writer that hashes everything passing through it
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Downloaded artifacts for one flashing attempt
#[derive(Debug)]
pub struct ArtifactCache {
    dir: PathBuf,
    stored: Vec<PathBuf>,
}

impl ArtifactCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stored: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files stored so far
    pub fn stored(&self) -> &[PathBuf] {
        &self.stored
    }

    /// Fetch and verify the artifact behind a segment
    pub fn download(
        &mut self,
        fetcher: &dyn ArtifactFetcher,
        segment: &FlashSegment,
    ) -> Result<(), FlashError> {
        if self.stored.contains(&segment.path) {
            debug!("{} already downloaded", segment.path.display());
            return Ok(());
        }

        let cache_error = |reason: io::Error| FlashError::Cache {
            path: self.dir.clone(),
            reason: reason.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(cache_error)?;
        // Whatever sits at the target path is not trusted
        remove_if_exists(&segment.path).map_err(cache_error)?;

        let temp = NamedTempFile::new_in(&self.dir).map_err(cache_error)?;
        let mut writer = HashingWriter {
            inner: temp,
            hasher: Sha256::new(),
        };

        let bytes = fetcher
            .fetch_into(&segment.source.url, &mut writer)
            .map_err(|reason| FlashError::Download {
                artifact: segment.kind,
                url: segment.source.url.clone(),
                reason,
            })?;
        writer.flush().map_err(cache_error)?;

        let actual = hex::encode(writer.hasher.finalize());
        let expected = segment.source.checksum.trim().to_ascii_lowercase();
        if actual != expected {
            // Dropping the temp file deletes it
            return Err(FlashError::ChecksumMismatch {
                artifact: segment.kind,
                expected,
                actual,
            });
        }

        writer
            .inner
            .persist(&segment.path)
            .map_err(|e| cache_error(e.error))?;
        debug!(
            "Stored {} ({} bytes) at {}",
            segment.kind,
            bytes,
            segment.path.display()
        );
        self.stored.push(segment.path.clone());
        Ok(())
    }

    /// Delete every stored file, returning how many were removed
    pub fn evict(&mut self) -> usize {
        let mut removed = 0;
        for path in self.stored.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        removed
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
