//! Carrier RPC
//!
//! Drives a `DynamicProvider` over any async byte stream, one JSON object per
//! line in each direction. Requests run concurrently, so responses may come
//! back in a different order than the requests; match them by `id`.

mod protocol;
mod server;

pub use protocol::{ErrorBody, Method, ParseMethodError, Request, Response, ResponseBody, INVALID_REQUEST};
pub use server::{RpcError, RpcServer};
