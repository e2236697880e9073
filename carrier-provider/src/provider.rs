//! DynamicProvider - lifecycle dispatch engine
//!
//! Every request carries its handler text under the reserved key. Dispatch
//! pulls the text out, resolves it through the `BundleCache`, and either calls
//! the bundle's operation or applies the default for an optional one:
//!
//! | operation | missing from bundle |
//! |-----------|---------------------|
//! | check     | accept news as-is   |
//! | diff      | no changes          |
//! | create    | `NotImplemented`    |
//! | read      | echo id and props   |
//! | update    | `NotImplemented`    |
//! | delete    | succeed silently    |
//!
//! Outputs of create, update and read always carry the handler text of the
//! call that produced them, so the next lifecycle call can find it again.

use std::sync::Arc;

use carrier_bundle::{HandlerBundle, Operation};
use carrier_model::{
    CheckRequest, CheckResult, CreateRequest, CreateResult, DeleteRequest, DiffRequest, DiffResult,
    HandlerText, HandlerTextError, ReadRequest, ReadResult, UpdateRequest, UpdateResult,
    RESERVED_KEY,
};
use tracing::debug;

use crate::config::normalize_version;
use crate::{
    BundleCache, DescriptorResolver, HandlerFactory, HandlerRegistry, HandlerResolver, ProviderConfig,
    ProviderError,
};

pub struct DynamicProvider {
    version: String,
    cache: Arc<BundleCache>,
}

impl DynamicProvider {
    pub fn new(version: &str, cache: Arc<BundleCache>) -> Self {
        Self { version: normalize_version(version), cache }
    }

    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    /// Provider version, without any leading `v`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn cache(&self) -> &Arc<BundleCache> {
        &self.cache
    }

    /// Resolve the bundle named by `text` on behalf of `operation`.
    async fn bundle_for(
        &self,
        operation: Operation,
        text: Result<HandlerText, HandlerTextError>,
    ) -> Result<(HandlerText, Arc<HandlerBundle>), ProviderError> {
        let text = text.map_err(|source| ProviderError::MissingHandler { operation, source })?;
        let bundle = self.cache.resolve(&text).await?;
        Ok((text, bundle))
    }

    /// Validate inputs.
    ///
    /// During preview the new handler text may still be unknown; the previous
    /// state's handler is used instead. No other operation does this.
    pub async fn check(&self, req: CheckRequest) -> Result<CheckResult, ProviderError> {
        let text = if req.news.handler_is_unknown() {
            debug!(urn = %req.urn, "Handler text unknown in news, checking with olds");
            req.olds.handler_text()
        } else {
            req.news.handler_text()
        };
        let (text, bundle) = self.bundle_for(Operation::Check, text).await?;

        match bundle.check() {
            Some(check) => Ok(check.call(req).await?),
            None => {
                debug!(urn = %req.urn, handler = %text.digest(), "No check, accepting inputs");
                Ok(CheckResult::passthrough(req.news))
            }
        }
    }

    pub async fn diff(&self, req: DiffRequest) -> Result<DiffResult, ProviderError> {
        let (text, bundle) = self.bundle_for(Operation::Diff, req.news.handler_text()).await?;

        let Some(diff) = bundle.diff() else {
            debug!(urn = %req.urn, handler = %text.digest(), "No diff, reporting no changes");
            return Ok(DiffResult::default());
        };

        let mut result = diff.call(req).await?;
        // A new handler text alone never forces replacement.
        if let Some(replaces) = result.replaces.as_mut() {
            replaces.retain(|key| key != RESERVED_KEY);
        }
        Ok(result)
    }

    pub async fn create(&self, req: CreateRequest) -> Result<CreateResult, ProviderError> {
        let (text, bundle) = self.bundle_for(Operation::Create, req.inputs.handler_text()).await?;
        let create = bundle.create().ok_or(ProviderError::NotImplemented(Operation::Create))?;

        let urn = req.urn.clone();
        let mut result = create.call(req).await?;
        result.outs.attach_handler(&text);
        debug!(urn = %urn, id = %result.id, handler = %text.digest(), "Created resource");
        Ok(result)
    }

    /// Refresh state. Without props there is no handler to resolve.
    pub async fn read(&self, req: ReadRequest) -> Result<ReadResult, ProviderError> {
        let text = match &req.props {
            Some(props) => props.handler_text(),
            None => Err(HandlerTextError::Missing),
        };
        let (text, bundle) = self.bundle_for(Operation::Read, text).await?;

        let Some(read) = bundle.read() else {
            debug!(urn = %req.urn, handler = %text.digest(), "No read, echoing props");
            let props = req.props.unwrap_or_default();
            return Ok(ReadResult { id: req.id, props });
        };

        let mut result = read.call(req).await?;
        result.props.attach_handler(&text);
        Ok(result)
    }

    pub async fn update(&self, req: UpdateRequest) -> Result<UpdateResult, ProviderError> {
        let (text, bundle) = self.bundle_for(Operation::Update, req.news.handler_text()).await?;
        let update = bundle.update().ok_or(ProviderError::NotImplemented(Operation::Update))?;

        let mut result = update.call(req).await?;
        result.outs.attach_handler(&text);
        Ok(result)
    }

    pub async fn delete(&self, req: DeleteRequest) -> Result<(), ProviderError> {
        let (text, bundle) = self.bundle_for(Operation::Delete, req.props.handler_text()).await?;

        match bundle.delete() {
            Some(delete) => {
                let urn = req.urn.clone();
                delete.call(req).await?;
                debug!(urn = %urn, handler = %text.digest(), "Deleted resource");
            }
            None => debug!(urn = %req.urn, handler = %text.digest(), "No delete, nothing to do"),
        }
        Ok(())
    }
}

/// Builder for DynamicProvider.
///
/// Without an explicit resolver, a `DescriptorResolver` is built from the
/// config and the registry.
pub struct ProviderBuilder {
    config: ProviderConfig,
    registry: Arc<HandlerRegistry>,
    resolver: Option<Arc<dyn HandlerResolver>>,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            config: ProviderConfig::default(),
            registry: Arc::new(HandlerRegistry::new()),
            resolver: None,
        }
    }

    pub fn config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a shared registry instead of a fresh one.
    pub fn registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Add a handler factory to the registry.
    pub fn register(self, name: impl Into<String>, factory: impl HandlerFactory + 'static) -> Self {
        self.registry.register(name, factory);
        self
    }

    /// Replace descriptor resolution entirely.
    pub fn resolver(mut self, resolver: Arc<dyn HandlerResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> DynamicProvider {
        let resolver = self.resolver.unwrap_or_else(|| {
            Arc::new(DescriptorResolver::from_config(&self.config, self.registry.clone()))
        });
        DynamicProvider::new(&self.config.version, Arc::new(BundleCache::new(resolver)))
    }
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
