//! Handler Registry - in-process handler factories
//!
//! Uses factory registration pattern: register a `HandlerFactory` under a
//! name, then `registered` descriptors naming it are built from their
//! captured config.

use std::collections::HashMap;
use std::error::Error;
use std::sync::RwLock;

use carrier_bundle::HandlerBundle;
use tracing::info;

use crate::ResolveError;

/// Builds a handler bundle from the configuration captured by the client.
pub trait HandlerFactory: Send + Sync {
    fn build(&self, config: &serde_json::Value) -> Result<HandlerBundle, Box<dyn Error + Send + Sync>>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&serde_json::Value) -> Result<HandlerBundle, Box<dyn Error + Send + Sync>> + Send + Sync,
{
    fn build(&self, config: &serde_json::Value) -> Result<HandlerBundle, Box<dyn Error + Send + Sync>> {
        self(config)
    }
}

/// Name → factory map, shared by every resolution.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: RwLock<HashMap<String, Box<dyn HandlerFactory>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one with the same name.
    pub fn register(&self, name: impl Into<String>, factory: impl HandlerFactory + 'static) {
        let name = name.into();
        let mut factories = self.factories.write().unwrap_or_else(|e| e.into_inner());
        if factories.insert(name.clone(), Box::new(factory)).is_some() {
            info!(factory = %name, "Replaced handler factory");
        } else {
            info!(factory = %name, "Registered handler factory");
        }
    }

    /// Builder-style `register`.
    pub fn with(self, name: impl Into<String>, factory: impl HandlerFactory + 'static) -> Self {
        self.register(name, factory);
        self
    }

    /// Build a bundle with the factory registered under `name`.
    pub fn build(&self, name: &str, config: &serde_json::Value) -> Result<HandlerBundle, ResolveError> {
        let factories = self.factories.read().unwrap_or_else(|e| e.into_inner());
        let factory = factories
            .get(name)
            .ok_or_else(|| ResolveError::UnknownFactory(name.to_string()))?;
        factory.build(config).map_err(|e| ResolveError::Factory {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .read()
            .map(|f| f.contains_key(name))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrier_bundle::{HandlerError, Operation};
    use carrier_model::{CreateRequest, CreateResult};
    use serde_json::json;

    fn counter_factory(config: &serde_json::Value) -> Result<HandlerBundle, Box<dyn Error + Send + Sync>> {
        let start = config
            .get("start")
            .and_then(|v| v.as_u64())
            .ok_or("missing numeric `start`")?;
        Ok(HandlerBundle::new().with_create(move |req: CreateRequest| async move {
            Ok::<_, HandlerError>(CreateResult { id: start.to_string().into(), outs: req.inputs })
        }))
    }

    #[test]
    fn test_build_registered() {
        let registry = HandlerRegistry::new().with("counter", counter_factory);
        assert!(registry.contains("counter"));

        let bundle = registry.build("counter", &json!({"start": 7})).unwrap();
        assert_eq!(bundle.operations(), vec![Operation::Create]);
    }

    #[test]
    fn test_unknown_factory() {
        let registry = HandlerRegistry::new();
        let err = registry.build("nope", &json!(null)).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownFactory(name) if name == "nope"));
    }

    #[test]
    fn test_factory_rejects_config() {
        let registry = HandlerRegistry::new().with("counter", counter_factory);
        let err = registry.build("counter", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "handler factory 'counter' failed: missing numeric `start`");
    }
}
