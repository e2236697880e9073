//! Bundle serialization
//!
//! A `PortableHandler` is a handler implementation that can describe itself
//! as a `HandlerDescriptor`: which code to run and every value that code
//! captured. `BundleSerializer` encodes that description into `HandlerText`
//! and remembers the result per handler instance, so a program that creates
//! many resources from one handler pays for serialization once.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use carrier_model::{DescriptorError, HandlerDescriptor, HandlerText};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("handler '{handler}' captured state that cannot be serialized: {source}")]
    Capture {
        handler: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Encode(#[from] DescriptorError),
}

/// A handler implementation that can travel inside resource state.
pub trait PortableHandler: Send + Sync {
    fn descriptor(&self) -> Result<HandlerDescriptor, SerializeError>;
}

/// A handler built on the provider side by a registered factory.
///
/// `config` is everything the factory needs; it is captured when the handler
/// is serialized, not when it is constructed.
#[derive(Debug, Clone)]
pub struct RegisteredHandler<C> {
    name: String,
    config: C,
}

impl<C: Serialize> RegisteredHandler<C> {
    pub fn new(name: impl Into<String>, config: C) -> Self {
        Self { name: name.into(), config }
    }
}

impl<C: Serialize + Send + Sync> PortableHandler for RegisteredHandler<C> {
    fn descriptor(&self) -> Result<HandlerDescriptor, SerializeError> {
        let config = serde_json::to_value(&self.config)
            .map_err(|source| SerializeError::Capture { handler: self.name.clone(), source })?;
        Ok(HandlerDescriptor::registered(self.name.clone(), config))
    }
}

/// A handler implemented by an external program.
#[derive(Debug, Clone, Default)]
pub struct ExecHandler {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl ExecHandler {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), ..Default::default() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl PortableHandler for ExecHandler {
    fn descriptor(&self) -> Result<HandlerDescriptor, SerializeError> {
        Ok(HandlerDescriptor::Exec {
            program: self.program.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        })
    }
}

/// Serialized text per live handler instance.
///
/// Entries are keyed by the handler's address and hold only a weak reference,
/// so a handler is never kept alive by the cache. An entry whose handler has
/// been dropped is stale even if the address is reused, and is ignored.
#[derive(Default)]
pub struct BundleSerializer {
    cache: Mutex<HashMap<usize, (Weak<dyn PortableHandler>, HandlerText)>>,
}

impl BundleSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide serializer.
    pub fn global() -> Arc<BundleSerializer> {
        static GLOBAL: OnceLock<Arc<BundleSerializer>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(BundleSerializer::new())).clone()
    }

    pub fn serialize(&self, handler: &Arc<dyn PortableHandler>) -> Result<HandlerText, SerializeError> {
        let key = address(handler);
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            // While `handler` is alive no other live handler shares its address,
            // so a live entry at this address is this handler's.
            if let Some((weak, text)) = cache.get(&key) {
                if weak.strong_count() > 0 {
                    return Ok(text.clone());
                }
            }
        }

        let text = handler.descriptor()?.encode()?;
        debug!(handler = %text.digest(), bytes = text.as_str().len(), "Serialized handler");

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.retain(|_, (weak, _)| weak.strong_count() > 0);
        cache.insert(key, (Arc::downgrade(handler), text.clone()));
        Ok(text)
    }

    /// Number of live cached handlers.
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .map(|c| c.values().filter(|(weak, _)| weak.strong_count() > 0).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn address(handler: &Arc<dyn PortableHandler>) -> usize {
    Arc::as_ptr(handler) as *const () as usize
}
