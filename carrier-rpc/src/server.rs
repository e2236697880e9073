//! RPC server loop
//!
//! One reader loop splits the input into lines and spawns a task per request.
//! Every task sends its response to a single writer task, which owns the
//! output stream. On end of input the server waits for requests still in
//! flight, flushes their responses, and returns.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use carrier_provider::{DynamicProvider, ProviderError};
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{ErrorBody, Method, Request, Response};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

/// Serves a `DynamicProvider` over newline-delimited JSON.
pub struct RpcServer {
    provider: Arc<DynamicProvider>,
}

impl RpcServer {
    pub fn new(provider: Arc<DynamicProvider>) -> Self {
        Self { provider }
    }

    /// Serve until `reader` reaches end of input.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), RpcError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Response>();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        info!(version = %self.provider.version(), "RPC server ready");

        let mut in_flight = JoinSet::new();
        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request = match parse_request(line) {
                Ok(request) => request,
                Err(response) => {
                    let _ = tx.send(response);
                    continue;
                }
            };

            let provider = self.provider.clone();
            let tx = tx.clone();
            in_flight.spawn(async move {
                let _ = tx.send(handle_guarded(&provider, request).await);
            });

            // Reap finished requests so the set does not grow without bound.
            while in_flight.try_join_next().is_some() {}
        }

        debug!(pending = in_flight.len(), "Input closed, draining requests");
        while in_flight.join_next().await.is_some() {}
        drop(tx);

        writer_task.await??;
        info!("RPC server stopped");
        Ok(())
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Response>) -> Result<(), RpcError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Parse one input line, or produce the `invalid_request` answer for it.
fn parse_request(line: &str) -> Result<Request, Response> {
    let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
        warn!(error = %e, "Malformed request line");
        Response::error(None, ErrorBody::invalid_request(format!("malformed request: {}", e)))
    })?;
    let id = value.get("id").and_then(|v| v.as_u64());
    serde_json::from_value(value).map_err(|e| {
        warn!(?id, error = %e, "Invalid request envelope");
        Response::error(id, ErrorBody::invalid_request(format!("invalid request: {}", e)))
    })
}

/// Like `handle`, but a panicking handler still gets its request answered.
async fn handle_guarded(provider: &DynamicProvider, request: Request) -> Response {
    let id = request.id;
    match AssertUnwindSafe(handle(provider, request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic_message(&*panic);
            error!(id, panic = %message, "Request handler panicked");
            Response::error(Some(id), ErrorBody::new("handler_failed", format!("handler panicked: {}", message)))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn handle(provider: &DynamicProvider, request: Request) -> Response {
    let Request { id, method, params } = request;
    debug!(id, %method, "Handling request");

    match dispatch(provider, &method, params).await {
        Ok(result) => Response::result(id, result),
        Err(error) => {
            warn!(id, %method, code = %error.code, error = %error.message, "Request failed");
            Response::error(Some(id), error)
        }
    }
}

async fn dispatch(provider: &DynamicProvider, method: &str, params: serde_json::Value) -> Result<serde_json::Value, ErrorBody> {
    let method: Method = method.parse().map_err(|e| ErrorBody::invalid_request(format!("{}", e)))?;
    match method {
        Method::PluginInfo => Ok(json!({ "version": provider.version() })),
        Method::Check => call(params, |req| provider.check(req)).await,
        Method::Diff => call(params, |req| provider.diff(req)).await,
        Method::Create => call(params, |req| provider.create(req)).await,
        Method::Read => call(params, |req| provider.read(req)).await,
        Method::Update => call(params, |req| provider.update(req)).await,
        Method::Delete => call(params, |req| provider.delete(req)).await,
    }
}

/// Decode params, run one provider operation, encode its result.
async fn call<Req, Resp, Fut>(params: serde_json::Value, op: impl FnOnce(Req) -> Fut) -> Result<serde_json::Value, ErrorBody>
where
    Req: DeserializeOwned,
    Resp: Serialize,
    Fut: Future<Output = Result<Resp, ProviderError>>,
{
    let request: Req = serde_json::from_value(params)
        .map_err(|e| ErrorBody::invalid_request(format!("invalid params: {}", e)))?;
    let response = op(request).await?;
    serde_json::to_value(response)
        .map_err(|e| ErrorBody::new("handler_failed", format!("unencodable result: {}", e)))
}
