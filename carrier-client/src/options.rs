//! Resource options passed through to the orchestrator.

use carrier_model::Urn;
use serde::{Deserialize, Serialize};

/// Options controlling how the orchestrator manages a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Urn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Urn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_changes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_before_replace: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_on_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<Urn>,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(mut self, parent: impl Into<Urn>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn depends_on(mut self, urn: impl Into<Urn>) -> Self {
        self.depends_on.push(urn.into());
        self
    }

    pub fn protect(mut self, protect: bool) -> Self {
        self.protect = Some(protect);
        self
    }

    pub fn ignore_changes(mut self, property: impl Into<String>) -> Self {
        self.ignore_changes.push(property.into());
        self
    }

    pub fn delete_before_replace(mut self, value: bool) -> Self {
        self.delete_before_replace = Some(value);
        self
    }

    /// Lay `overrides` over `self`.
    ///
    /// Scalars set in `overrides` win. Lists are concatenated, `self` first.
    pub fn merge(&self, overrides: &ResourceOptions) -> ResourceOptions {
        ResourceOptions {
            parent: overrides.parent.clone().or_else(|| self.parent.clone()),
            depends_on: concat(&self.depends_on, &overrides.depends_on),
            protect: overrides.protect.or(self.protect),
            ignore_changes: concat(&self.ignore_changes, &overrides.ignore_changes),
            delete_before_replace: overrides.delete_before_replace.or(self.delete_before_replace),
            retain_on_delete: overrides.retain_on_delete.or(self.retain_on_delete),
            aliases: concat(&self.aliases, &overrides.aliases),
        }
    }
}

fn concat<T: Clone>(first: &[T], second: &[T]) -> Vec<T> {
    first.iter().chain(second).cloned().collect()
}
