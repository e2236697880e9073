//! Carrier Model
//!
//! Pure data types for the Carrier dynamic provider, decoupled from
//! handler execution, resolution backends, and transports:
//! - **PropertyBag**: resource input/output state, including the reserved handler key
//! - **HandlerText**: the serialized handler carried through a resource's lifecycle
//! - **HandlerDescriptor**: the deterministic encoding behind a `HandlerText`
//! - **Lifecycle types**: requests and results for check/diff/create/read/update/delete

pub mod types;
pub mod property;
pub mod handler_text;
pub mod descriptor;
pub mod lifecycle;
pub mod digest;

// Re-exports
pub use types::{ResourceId, Urn};
pub use property::{is_unknown, HandlerTextError, PropertyBag, PropertyValue, RESERVED_KEY, UNKNOWN_VALUE};
pub use handler_text::HandlerText;
pub use descriptor::{DescriptorError, HandlerDescriptor};
pub use lifecycle::{
    CheckFailure, CheckRequest, CheckResult, CreateRequest, CreateResult, DeleteRequest,
    DiffRequest, DiffResult, ReadRequest, ReadResult, UpdateRequest, UpdateResult,
};
pub use digest::HandlerDigest;
