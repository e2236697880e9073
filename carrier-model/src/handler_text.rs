//! Serialized handler text
//!
//! The opaque, immutable blob that travels under the reserved property key.
//! String equality is the only contract, which makes it a valid cache key.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::HandlerDigest;

/// Portable, cacheable encoding of a handler bundle.
///
/// Cloning is cheap: the text is shared behind an `Arc`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerText(Arc<str>);

impl HandlerText {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short content digest, suitable for log fields.
    pub fn digest(&self) -> HandlerDigest {
        HandlerDigest::of(self.as_str())
    }
}

impl From<&str> for HandlerText {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for HandlerText {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl AsRef<str> for HandlerText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Handler text can be large; Debug shows the digest instead.
impl fmt::Debug for HandlerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerText({}, {} bytes)", self.digest(), self.0.len())
    }
}

impl Serialize for HandlerText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HandlerText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_textual() {
        let a = HandlerText::from("bundleA");
        let b = HandlerText::from(String::from("bundleA"));
        assert_eq!(a, b);
        assert_ne!(a, HandlerText::from("bundleB"));
    }

    #[test]
    fn test_debug_hides_text() {
        let t = HandlerText::from("a very secret closure body");
        let dbg = format!("{:?}", t);
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("26 bytes"));
    }
}
