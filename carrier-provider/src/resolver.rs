//! Handler resolution
//!
//! `HandlerResolver` is the seam between handler text and live code. The
//! dispatch engine and cache never look inside the text; they only need a
//! resolver that can turn it back into a `HandlerBundle`.

use std::sync::Arc;

use async_trait::async_trait;
use carrier_bundle::HandlerBundle;
use carrier_model::{HandlerDescriptor, HandlerText};

use crate::{ExecResolver, HandlerRegistry, ProviderConfig, ResolveError};

/// Turns handler text into a callable bundle.
///
/// Implementations may be slow or fail transiently; the `BundleCache` in front
/// of them guarantees each distinct text is resolved successfully at most once.
#[async_trait]
pub trait HandlerResolver: Send + Sync {
    async fn resolve(&self, text: &HandlerText) -> Result<HandlerBundle, ResolveError>;
}

/// Resolves `HandlerDescriptor` text, routing by descriptor kind.
pub struct DescriptorResolver {
    registry: Arc<HandlerRegistry>,
    exec: Option<ExecResolver>,
}

impl DescriptorResolver {
    /// Resolver for `registered` descriptors only.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry, exec: None }
    }

    /// Also accept `exec` descriptors.
    pub fn with_exec(mut self, exec: ExecResolver) -> Self {
        self.exec = Some(exec);
        self
    }

    pub fn from_config(config: &ProviderConfig, registry: Arc<HandlerRegistry>) -> Self {
        let resolver = Self::new(registry);
        if config.exec.enabled {
            resolver.with_exec(ExecResolver::new(config.exec.dir.clone()))
        } else {
            resolver
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }
}

#[async_trait]
impl HandlerResolver for DescriptorResolver {
    async fn resolve(&self, text: &HandlerText) -> Result<HandlerBundle, ResolveError> {
        let descriptor = HandlerDescriptor::decode(text)?;
        tracing::debug!(
            handler = %text.digest(),
            kind = descriptor.kind(),
            descriptor = %descriptor,
            "Decoded handler descriptor"
        );

        match descriptor {
            HandlerDescriptor::Registered { name, config } => self.registry.build(&name, &config),
            HandlerDescriptor::Exec { program, args, env } => {
                let exec = self.exec.as_ref().ok_or(ResolveError::ExecDisabled)?;
                exec.resolve(&program, args, env).await
            }
        }
    }
}
