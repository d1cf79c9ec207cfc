//! Byte range value object

use std::fmt;

/// Inclusive byte range `start..=end` within a resource of `total` bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Create a range. Callers are expected to have validated the bounds.
    pub fn new(start: u64, end: u64, total: u64) -> Self {
        Self { start, end, total }
    }

    /// Number of bytes covered
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Ranges are inclusive, so a valid range is never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for the `Content-Range` response header
    pub fn content_range(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}-{}/{}", self.start, self.end, self.total)
    }
}
