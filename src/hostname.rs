//! Hostname entries as read from input files.

use std::fmt;

/// One hostname token, kept as the exact bytes read from the input.
///
/// Input files are not required to be UTF-8. A token that is not valid UTF-8
/// cannot be handed to a resolver, but it is still written back verbatim so
/// every input token maps to exactly one output record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname {
    bytes: Vec<u8>,
}

impl Hostname {
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The raw token bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The token as text, or `None` if it is not valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for Hostname {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Hostname {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl PartialEq<&str> for Hostname {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

/// Lossy rendering, for logs only.
impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}
