//! Handler bundles
//!
//! A handler bundle is the resource author's CRUD implementation: a set of
//! operation slots `{check?, diff?, create, read?, update?, delete?}`.
//! Slots are explicit `Option`s so the provider checks capabilities once per
//! call instead of probing for methods.

mod bundle;
mod error;
mod op;
mod operation;

pub use bundle::HandlerBundle;
pub use error::HandlerError;
pub use op::{BoxFuture, Op};
pub use operation::{Operation, ParseOperationError};
