//! RPC server over an in-memory duplex stream.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use carrier_provider::model::{CreateRequest, CreateResult, HandlerDescriptor, HandlerText};
use carrier_provider::{DynamicProvider, HandlerBundle, HandlerError, ProviderConfig};
use carrier_rpc::{Response, ResponseBody, RpcServer};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

/// create sleeps for `delayMs` from its inputs, then echoes them.
fn sleepy(_config: &Value) -> Result<HandlerBundle, Box<dyn Error + Send + Sync>> {
    Ok(HandlerBundle::new().with_create(|req: CreateRequest| async move {
        let delay = req.inputs.get("delayMs").and_then(|v| v.as_u64()).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok::<_, HandlerError>(CreateResult { id: format!("id-{}", delay).into(), outs: req.inputs.without_handler() })
    }))
}

/// create panics instead of returning an error.
fn broken(_config: &Value) -> Result<HandlerBundle, Box<dyn Error + Send + Sync>> {
    Ok(HandlerBundle::new().with_create(|req: CreateRequest| async move {
        if req.inputs.get("explode").is_some() {
            panic!("bucket handler exploded");
        }
        Ok::<_, HandlerError>(CreateResult { id: "calm".into(), outs: req.inputs.without_handler() })
    }))
}

struct Client {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    server: JoinHandle<()>,
}

impl Client {
    fn start() -> Self {
        let provider = DynamicProvider::builder()
            .config(ProviderConfig::new("v3.1.0"))
            .register("sleepy", sleepy)
            .register("broken", broken)
            .build();
        let server = RpcServer::new(Arc::new(provider));

        let (client, remote) = tokio::io::duplex(64 * 1024);
        let (remote_read, remote_write) = tokio::io::split(remote);
        let server = tokio::spawn(async move {
            server.serve(remote_read, remote_write).await.unwrap();
        });

        let (read, writer) = tokio::io::split(client);
        Self { writer, lines: BufReader::new(read).lines(), server }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> Response {
        let line = self.lines.next_line().await.unwrap().expect("server closed the stream");
        serde_json::from_str(&line).unwrap()
    }

    async fn close(mut self) {
        self.writer.shutdown().await.unwrap();
        self.server.await.unwrap();
    }
}

fn text() -> HandlerText {
    HandlerDescriptor::registered("sleepy", json!(null)).encode().unwrap()
}

fn create_line(id: u64, delay_ms: u64) -> String {
    json!({
        "id": id,
        "method": "create",
        "params": {"urn": format!("urn{}", id), "inputs": {"__provider": text().as_str(), "delayMs": delay_ms}},
    })
    .to_string()
}

fn error_code(response: &Response) -> &str {
    match &response.body {
        ResponseBody::Error(e) => &e.code,
        ResponseBody::Result(r) => panic!("expected error, got {}", r),
    }
}

#[tokio::test]
async fn test_plugin_info_reports_version() {
    let mut client = Client::start();
    client.send(r#"{"id": 1, "method": "pluginInfo"}"#).await;

    let response = client.recv().await;
    assert_eq!(response, Response::result(1, json!({"version": "3.1.0"})));
    client.close().await;
}

#[tokio::test]
async fn test_create_round_trip() {
    let mut client = Client::start();
    client.send(&create_line(5, 0)).await;

    let response = client.recv().await;
    assert_eq!(response.id, Some(5));
    let ResponseBody::Result(result) = response.body else {
        panic!("create failed: {:?}", response.body);
    };
    assert_eq!(result["id"], json!("id-0"));
    assert_eq!(result["outs"]["__provider"], json!(text().as_str()));
    client.close().await;
}

#[tokio::test]
async fn test_responses_arrive_as_requests_finish() {
    let mut client = Client::start();
    client.send(&create_line(1, 300)).await;
    client.send(&create_line(2, 0)).await;

    let first = client.recv().await;
    let second = client.recv().await;
    assert_eq!(first.id, Some(2));
    assert_eq!(second.id, Some(1));
    client.close().await;
}

#[tokio::test]
async fn test_error_codes() {
    let mut client = Client::start();

    client.send("{not json").await;
    let response = client.recv().await;
    assert_eq!(response.id, None);
    assert_eq!(error_code(&response), "invalid_request");

    client.send(r#"{"id": 2, "method": "destroy", "params": {}}"#).await;
    assert_eq!(error_code(&client.recv().await), "invalid_request");

    client.send(r#"{"id": 3, "method": "create", "params": {"urn": "urn3"}}"#).await;
    assert_eq!(error_code(&client.recv().await), "invalid_request");

    client.send(r#"{"id": 4, "method": "create", "params": {"urn": "urn4", "inputs": {}}}"#).await;
    assert_eq!(error_code(&client.recv().await), "missing_handler");

    let update = json!({
        "id": 5,
        "method": "update",
        "params": {"id": "x", "urn": "urn5", "olds": {}, "news": {"__provider": text().as_str()}},
    });
    client.send(&update.to_string()).await;
    let response = client.recv().await;
    assert_eq!(response.id, Some(5));
    assert_eq!(error_code(&response), "not_implemented");

    let unknown = HandlerDescriptor::registered("missing", json!(null)).encode().unwrap();
    let create = json!({
        "id": 6,
        "method": "create",
        "params": {"urn": "urn6", "inputs": {"__provider": unknown.as_str()}},
    });
    client.send(&create.to_string()).await;
    assert_eq!(error_code(&client.recv().await), "resolve_failed");

    client.close().await;
}

#[tokio::test]
async fn test_delete_without_operation_returns_null() {
    let mut client = Client::start();
    let delete = json!({
        "id": 8,
        "method": "delete",
        "params": {"id": "x", "urn": "urn8", "props": {"__provider": text().as_str()}},
    });
    client.send(&delete.to_string()).await;
    assert_eq!(client.recv().await, Response::result(8, Value::Null));
    client.close().await;
}

#[tokio::test]
async fn test_drains_in_flight_on_close() {
    let mut client = Client::start();
    client.send(&create_line(1, 100)).await;
    client.writer.shutdown().await.unwrap();

    // The response still arrives after input is closed.
    let response = client.recv().await;
    assert_eq!(response.id, Some(1));
    assert!(!response.is_error());
    client.server.await.unwrap();
}

#[tokio::test]
async fn test_handler_panic_is_answered() {
    let mut client = Client::start();
    let broken = HandlerDescriptor::registered("broken", json!(null)).encode().unwrap();
    let create = json!({
        "id": 11,
        "method": "create",
        "params": {"urn": "urn11", "inputs": {"__provider": broken.as_str(), "explode": true}},
    });
    client.send(&create.to_string()).await;

    let response = client.recv().await;
    assert_eq!(response.id, Some(11));
    assert_eq!(error_code(&response), "handler_failed");
    let ResponseBody::Error(error) = &response.body else { unreachable!() };
    assert!(error.message.contains("bucket handler exploded"));

    // The same bundle keeps serving after the panic.
    let create = json!({
        "id": 12,
        "method": "create",
        "params": {"urn": "urn12", "inputs": {"__provider": broken.as_str()}},
    });
    client.send(&create.to_string()).await;
    let response = client.recv().await;
    assert_eq!(response.id, Some(12));
    assert!(!response.is_error());

    client.send(r#"{"id": 13, "method": "pluginInfo"}"#).await;
    assert_eq!(client.recv().await, Response::result(13, json!({"version": "3.1.0"})));
    client.close().await;
}
