//! Handler descriptors
//!
//! A `HandlerDescriptor` is the self-describing form of a serialized handler:
//! which code to run, plus every value that code closed over. Encoding is
//! canonical JSON (object keys sorted), so equal descriptors always produce
//! equal `HandlerText` and therefore hit the same cache entry.
//!
//! | kind         | resolved by                          |
//! |--------------|--------------------------------------|
//! | `registered` | an in-process factory, looked up by name |
//! | `exec`       | an external program speaking JSON on stdio |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::HandlerText;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to encode handler descriptor: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode handler descriptor: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerDescriptor {
    /// A factory compiled into the provider, plus its captured configuration.
    Registered {
        name: String,
        #[serde(default)]
        config: serde_json::Value,
    },
    /// An external program invoked once per operation.
    Exec {
        program: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },
}

impl HandlerDescriptor {
    pub fn registered(name: impl Into<String>, config: serde_json::Value) -> Self {
        Self::Registered { name: name.into(), config }
    }

    pub fn exec(program: impl Into<String>) -> Self {
        Self::Exec { program: program.into(), args: Vec::new(), env: BTreeMap::new() }
    }

    /// Encode into canonical handler text.
    pub fn encode(&self) -> Result<HandlerText, DescriptorError> {
        // Going through Value sorts every object's keys, including the top level.
        let value = serde_json::to_value(self).map_err(DescriptorError::Encode)?;
        let text = serde_json::to_string(&value).map_err(DescriptorError::Encode)?;
        Ok(HandlerText::from(text))
    }

    pub fn decode(text: &HandlerText) -> Result<Self, DescriptorError> {
        serde_json::from_str(text.as_str()).map_err(DescriptorError::Decode)
    }

    /// The `kind` tag this descriptor encodes with.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "registered",
            Self::Exec { .. } => "exec",
        }
    }
}

impl fmt::Display for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered { name, .. } => write!(f, "registered:{}", name),
            Self::Exec { program, .. } => write!(f, "exec:{}", program),
        }
    }
}
