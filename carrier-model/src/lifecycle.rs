//! Lifecycle requests and results
//!
//! The generic resource-lifecycle contract between the orchestrator and the
//! provider. The same types are handed to handler bundle operations, so a
//! handler sees exactly what the provider received (reserved key included).

use serde::{Deserialize, Serialize};

use crate::{PropertyBag, ResourceId, Urn};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub urn: Urn,
    #[serde(default)]
    pub olds: PropertyBag,
    pub news: PropertyBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRequest {
    pub id: ResourceId,
    pub urn: Urn,
    pub olds: PropertyBag,
    pub news: PropertyBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub urn: Urn,
    pub inputs: PropertyBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub id: ResourceId,
    pub urn: Urn,
    #[serde(default)]
    pub props: Option<PropertyBag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub id: ResourceId,
    pub urn: Urn,
    pub olds: PropertyBag,
    pub news: PropertyBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: ResourceId,
    pub urn: Urn,
    pub props: PropertyBag,
}

// ============================================================================
// Results
// ============================================================================

/// A single validation failure reported by `check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    pub property: String,
    pub reason: String,
}

impl CheckFailure {
    pub fn new(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { property: property.into(), reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub inputs: PropertyBag,
    #[serde(default)]
    pub failures: Vec<CheckFailure>,
}

impl CheckResult {
    /// Accept `inputs` as-is with no failures.
    pub fn passthrough(inputs: PropertyBag) -> Self {
        Self { inputs, failures: Vec::new() }
    }
}

/// Outcome of `diff`.
///
/// Every field is optional; the all-`None` default means "no differences,
/// no replacement required".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_before_replace: Option<bool>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True if any property forces the resource to be replaced.
    pub fn requires_replacement(&self) -> bool {
        self.replaces.as_ref().is_some_and(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResult {
    pub id: ResourceId,
    #[serde(default)]
    pub outs: PropertyBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    #[serde(default)]
    pub outs: PropertyBag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    pub id: ResourceId,
    #[serde(default)]
    pub props: PropertyBag,
}
