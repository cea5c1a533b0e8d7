//! Flash target addresses

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// A `0x`-prefixed hexadecimal flash address.
///
/// The original spelling is preserved ("0x00000" stays "0x00000") because
/// the string is handed to the backend verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FlashAddress(Cow<'static, str>);

impl FlashAddress {
    /// Address of a fixed preset. Callers pass well-formed literals only.
    pub(crate) const fn fixed(address: &'static str) -> Self {
        Self(Cow::Borrowed(address))
    }

    /// Validate an address supplied by the catalog
    pub fn parse(address: &str) -> Option<Self> {
        let address = address.trim();
        let digits = address.strip_prefix("0x")?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(Cow::Owned(address.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlashAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
