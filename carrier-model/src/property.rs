//! Property bags and the reserved handler key.
//!
//! A `PropertyBag` is the durable state of one resource as the orchestrator
//! sees it: ordinary properties plus the reserved `__provider` entry holding
//! the serialized handler that manages the resource.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::HandlerText;

/// Name of the reserved property carrying the serialized handler.
///
/// Owned by the resource factory; user input must never define it.
pub const RESERVED_KEY: &str = "__provider";

/// Sentinel the orchestrator substitutes for values not yet known during preview.
pub const UNKNOWN_VALUE: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// A single property value.
pub type PropertyValue = serde_json::Value;

/// Returns true if `value` is the Unknown Placeholder.
pub fn is_unknown(value: &PropertyValue) -> bool {
    matches!(value, PropertyValue::String(s) if s == UNKNOWN_VALUE)
}

/// Why a bag could not yield a usable handler text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerTextError {
    #[error("property bag has no `__provider` entry")]
    Missing,
    #[error("`__provider` must be a string, found {0}")]
    NotText(&'static str),
    #[error("`__provider` is not yet known")]
    Unknown,
}

/// Mapping of property names to values.
///
/// Keys are kept sorted, not in insertion order. Bags with the same entries
/// compare equal and serialize to the same bytes however they were built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(BTreeMap<String, PropertyValue>);

impl PropertyBag {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyValue> {
        self.0.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, PropertyValue> {
        self.0.keys()
    }

    // ==================== Reserved key ====================

    /// True if the bag defines the reserved key at all, whatever its value.
    pub fn has_handler(&self) -> bool {
        self.0.contains_key(RESERVED_KEY)
    }

    /// True if the reserved key holds the Unknown Placeholder.
    pub fn handler_is_unknown(&self) -> bool {
        self.0.get(RESERVED_KEY).is_some_and(is_unknown)
    }

    /// The serialized handler carried by this bag.
    pub fn handler_text(&self) -> Result<HandlerText, HandlerTextError> {
        match self.0.get(RESERVED_KEY) {
            None => Err(HandlerTextError::Missing),
            Some(value) if is_unknown(value) => Err(HandlerTextError::Unknown),
            Some(PropertyValue::String(s)) => Ok(HandlerText::from(s.as_str())),
            Some(other) => Err(HandlerTextError::NotText(json_kind(other))),
        }
    }

    /// Set the reserved key, replacing whatever a handler may have put there.
    pub fn attach_handler(&mut self, text: &HandlerText) {
        self.0
            .insert(RESERVED_KEY.to_string(), PropertyValue::String(text.as_str().to_string()));
    }

    pub fn with_handler(mut self, text: &HandlerText) -> Self {
        self.attach_handler(text);
        self
    }

    /// A copy holding only user properties.
    ///
    /// Handlers use this to compare olds and news without seeing handler text changes.
    pub fn without_handler(&self) -> Self {
        let mut copy = self.clone();
        copy.0.remove(RESERVED_KEY);
        copy
    }
}

fn json_kind(value: &PropertyValue) -> &'static str {
    match value {
        PropertyValue::Null => "null",
        PropertyValue::Bool(_) => "bool",
        PropertyValue::Number(_) => "number",
        PropertyValue::String(_) => "string",
        PropertyValue::Array(_) => "array",
        PropertyValue::Object(_) => "object",
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyBag {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        Self(map)
    }
}

impl From<PropertyBag> for BTreeMap<String, PropertyValue> {
    fn from(bag: PropertyBag) -> Self {
        bag.0
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> Extend<(K, V)> for PropertyBag {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for PropertyBag {
    type Item = (String, PropertyValue);
    type IntoIter = btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertyBag {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handler_text_states() {
        let bag = PropertyBag::from_iter([("name", json!("foo"))]);
        assert_eq!(bag.handler_text(), Err(HandlerTextError::Missing));

        let bag = PropertyBag::from_iter([(RESERVED_KEY, json!(UNKNOWN_VALUE))]);
        assert!(bag.handler_is_unknown());
        assert_eq!(bag.handler_text(), Err(HandlerTextError::Unknown));

        let bag = PropertyBag::from_iter([(RESERVED_KEY, json!(7))]);
        assert_eq!(bag.handler_text(), Err(HandlerTextError::NotText("number")));

        let bag = PropertyBag::from_iter([(RESERVED_KEY, json!("bundleA"))]);
        assert_eq!(bag.handler_text().unwrap(), HandlerText::from("bundleA"));
    }

    #[test]
    fn test_attach_overwrites() {
        let mut bag = PropertyBag::from_iter([(RESERVED_KEY, json!("stale")), ("name", json!("foo"))]);
        bag.attach_handler(&HandlerText::from("fresh"));
        assert_eq!(bag.get(RESERVED_KEY), Some(&json!("fresh")));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_without_handler() {
        let bag = PropertyBag::from_iter([(RESERVED_KEY, json!("B")), ("name", json!("foo"))]);
        let user = bag.without_handler();
        assert!(!user.has_handler());
        assert_eq!(user, PropertyBag::from_iter([("name", json!("foo"))]));
        assert!(bag.has_handler());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let bag = PropertyBag::from_iter([("b", json!(2)), ("a", json!(1))]);
        assert_eq!(serde_json::to_string(&bag).unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_key_order_is_canonical() {
        let text = HandlerText::from("h");
        let forward = PropertyBag::from_iter([("name", json!("logs")), ("size", json!(3))]).with_handler(&text);

        let mut backward = PropertyBag::new().with_handler(&text);
        backward.insert("size", json!(3));
        backward.insert("name", json!("logs"));

        assert_eq!(forward, backward);
        assert_eq!(serde_json::to_vec(&forward).unwrap(), serde_json::to_vec(&backward).unwrap());

        let decoded: PropertyBag = serde_json::from_str(r#"{"size":3,"__provider":"h","name":"logs"}"#).unwrap();
        assert_eq!(decoded, forward);
        assert_eq!(
            decoded.keys().collect::<Vec<_>>(),
            vec!["__provider", "name", "size"]
        );
    }
}
