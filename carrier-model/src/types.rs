//! Strong types for resource identifiers
//!
//! Semantic newtypes over `String`, replacing raw strings in lifecycle calls.

use std::fmt;

/// Macro to define string identifiers with strong types.
///
/// Args:
/// - $name: The name of the struct (e.g., Urn)
/// - $doc: Documentation string
macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an owned string.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwrap into the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }
    };
}

define_id!(Urn, "Orchestrator-assigned unique resource name.");
define_id!(ResourceId, "Provider-assigned identifier of a managed object, produced by `create`.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_eq() {
        let urn = Urn::from("urn1");
        assert_eq!(urn, "urn1");
        assert_eq!(urn.to_string(), "urn1");
        assert_eq!(format!("{:?}", urn), "Urn(\"urn1\")");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ResourceId::new("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        let back: ResourceId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, id);
    }
}
