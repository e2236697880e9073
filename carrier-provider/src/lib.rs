//! Carrier Provider
//!
//! Server side of the Carrier dynamic provider:
//! - **HandlerResolver**: turns handler text back into a live `HandlerBundle`
//! - **DescriptorResolver**: routes descriptors to the registry or exec backend
//! - **HandlerRegistry**: in-process handler factories, looked up by name
//! - **ExecResolver**: handlers implemented by external programs
//! - **BundleCache**: process-wide, single-flight memo of resolved bundles
//! - **DynamicProvider**: the lifecycle dispatch engine

pub mod cache;
pub mod config;
pub mod error;
pub mod exec;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use cache::BundleCache;
pub use config::{ExecConfig, ProviderConfig};
pub use error::{ProviderError, ResolveError};
pub use exec::ExecResolver;
pub use provider::{DynamicProvider, ProviderBuilder};
pub use registry::{HandlerFactory, HandlerRegistry};
pub use resolver::{DescriptorResolver, HandlerResolver};

// Re-export the types consumers need to write handlers
pub use carrier_bundle::{HandlerBundle, HandlerError, Operation};
pub use carrier_model as model;
