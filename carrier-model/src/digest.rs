//! Content digests for handler text.
//!
//! BLAKE3 over the raw text, truncated to 8 bytes. Only used to identify a
//! handler in logs and error messages without printing the text itself.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerDigest([u8; 8]);

impl HandlerDigest {
    #[inline]
    pub fn of(text: &str) -> Self {
        let hash = blake3::hash(text.as_bytes());
        let mut short = [0u8; 8];
        short.copy_from_slice(&hash.as_bytes()[..8]);
        Self(short)
    }
}

impl fmt::Display for HandlerDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for HandlerDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        let a = HandlerDigest::of("bundleA");
        assert_eq!(a, HandlerDigest::of("bundleA"));
        assert_ne!(a, HandlerDigest::of("bundleB"));
        assert_eq!(a.to_string().len(), 16);
    }
}
