//! Resource factory
//!
//! Builds dynamic resources: checks the author's properties, embeds the
//! serialized handler under the reserved key, and hands everything to the
//! orchestrator's generic registration primitive.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use carrier_model::{PropertyBag, RESERVED_KEY};
use thiserror::Error;
use tracing::debug;

use crate::{BundleSerializer, PortableHandler, ResourceOptions, SerializeError};

/// Prefix of every dynamic resource type token.
pub const TYPE_PREFIX: &str = "carrier:dynamic:";

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("resource '{resource}' must not define the __provider property")]
    Configuration { resource: String },
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error("failed to register resource '{resource}': {source}")]
    Registrar {
        resource: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// A fully prepared registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterResource {
    pub type_token: String,
    pub name: String,
    /// Author properties plus the reserved handler key.
    pub props: PropertyBag,
    pub options: ResourceOptions,
}

/// The orchestrator client's resource-construction primitive.
#[async_trait]
pub trait ResourceRegistrar: Send + Sync {
    type Resource: Send;

    async fn register(&self, request: RegisterResource) -> Result<Self::Resource, Box<dyn Error + Send + Sync>>;
}

pub struct ResourceFactory<R> {
    registrar: Arc<R>,
    serializer: Arc<BundleSerializer>,
    defaults: ResourceOptions,
}

impl<R: ResourceRegistrar> ResourceFactory<R> {
    pub fn new(registrar: Arc<R>) -> Self {
        Self { registrar, serializer: BundleSerializer::global(), defaults: ResourceOptions::default() }
    }

    /// Use a dedicated serializer cache instead of the process-wide one.
    pub fn with_serializer(mut self, serializer: Arc<BundleSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Options every resource built here starts from.
    pub fn with_defaults(mut self, defaults: ResourceOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Register a resource whose lifecycle is implemented by `handler`.
    ///
    /// `type_name` is scoped under `carrier:dynamic:`.
    pub async fn build(
        &self,
        handler: &Arc<dyn PortableHandler>,
        type_name: &str,
        name: &str,
        props: PropertyBag,
        options: Option<ResourceOptions>,
    ) -> Result<R::Resource, FactoryError> {
        if props.contains_key(RESERVED_KEY) {
            return Err(FactoryError::Configuration { resource: name.to_string() });
        }

        let text = self.serializer.serialize(handler)?;
        let request = RegisterResource {
            type_token: format!("{}{}", TYPE_PREFIX, type_name),
            name: name.to_string(),
            props: props.with_handler(&text),
            options: match options {
                Some(options) => self.defaults.merge(&options),
                None => self.defaults.clone(),
            },
        };
        debug!(type_token = %request.type_token, name, handler = %text.digest(), "Registering dynamic resource");

        self.registrar
            .register(request)
            .await
            .map_err(|source| FactoryError::Registrar { resource: name.to_string(), source })
    }
}
