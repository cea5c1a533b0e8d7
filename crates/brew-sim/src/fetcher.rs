//! In-memory artifact server

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use brew_flash::ArtifactFetcher;

#[derive(Debug, Default)]
struct Served {
    files: HashMap<String, Vec<u8>>,
    requests: Vec<String>,
}

/// Serves artifact bytes by URL
///
/// Clones share the served files and the request log.
#[derive(Debug, Clone, Default)]
pub struct SimFetcher {
    inner: Rc<RefCell<Served>>,
}

impl SimFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` at `url`
    pub fn serve(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.inner
            .borrow_mut()
            .files
            .insert(url.into(), bytes.into());
    }

    /// Flip a bit in the file served at `url`
    pub fn corrupt(&self, url: &str) -> bool {
        match self.inner.borrow_mut().files.get_mut(url) {
            Some(bytes) if !bytes.is_empty() => {
                bytes[0] ^= 0x01;
                true
            }
            Some(bytes) => {
                bytes.push(0);
                true
            }
            None => false,
        }
    }

    /// Stop serving `url`
    pub fn remove(&self, url: &str) {
        self.inner.borrow_mut().files.remove(url);
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.inner.borrow().requests.clone()
    }
}

impl ArtifactFetcher for SimFetcher {
    fn fetch_into(&self, url: &str, out: &mut dyn Write) -> Result<u64, String> {
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(url.to_string());

        let bytes = inner
            .files
            .get(url)
            .ok_or_else(|| "HTTP status client error (404 Not Found)".to_string())?;
        out.write_all(bytes).map_err(|e| e.to_string())?;
        Ok(bytes.len() as u64)
    }
}
