use std::future::Future;
use std::pin::Pin;

use crate::HandlerError;

/// Type alias for a boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// One lifecycle operation of a handler bundle.
///
/// The returned future owns everything it needs, so the provider can run it
/// on any task without holding a borrow of the bundle.
pub trait Op<Req, Resp>: Send + Sync {
    fn call(&self, request: Req) -> BoxFuture<Result<Resp, HandlerError>>;
}

/// Any `Fn(Req) -> impl Future` is an operation.
impl<F, Fut, Req, Resp> Op<Req, Resp> for F
where
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
{
    fn call(&self, request: Req) -> BoxFuture<Result<Resp, HandlerError>> {
        Box::pin(self(request))
    }
}
