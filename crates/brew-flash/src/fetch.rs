//! Artifact fetching

use std::io::Write;

use tracing::debug;

/// Retrieves artifact bytes by URL
pub trait ArtifactFetcher {
    /// Stream the artifact at `url` into `out`, returning the byte count
    fn fetch_into(&self, url: &str, out: &mut dyn Write) -> Result<u64, String>;
}

/// Fetches artifacts over HTTP(S)
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch_into(&self, url: &str, out: &mut dyn Write) -> Result<u64, String> {
        debug!("GET {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;
        response.copy_to(out).map_err(|e| e.to_string())
    }
}
