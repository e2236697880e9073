//! Carrier Client
//!
//! What a resource author's program links against:
//! - **PortableHandler**: a handler implementation that can describe itself as data
//! - **BundleSerializer**: turns a handler into `HandlerText`, once per handler instance
//! - **ResourceFactory**: embeds the text under the reserved key and registers the resource

pub mod options;
pub mod resource;
pub mod serializer;

pub use options::ResourceOptions;
pub use resource::{FactoryError, RegisterResource, ResourceFactory, ResourceRegistrar, TYPE_PREFIX};
pub use serializer::{BundleSerializer, ExecHandler, PortableHandler, RegisteredHandler, SerializeError};

pub use carrier_model as model;
