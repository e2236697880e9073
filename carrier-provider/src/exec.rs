//! Exec handlers - bundles implemented by external programs
//!
//! Protocol between the provider and a handler program:
//! - `<program> [args..] describe` prints `{"operations": ["create", ...]}`.
//!   This runs once, at resolution time.
//! - `<program> [args..] <operation>` receives the lifecycle request as JSON on
//!   stdin and prints the result as JSON on stdout. `delete` may print nothing.
//! - A non-zero exit status is a failure; stderr becomes the error message.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use carrier_bundle::{BoxFuture, HandlerBundle, HandlerError, Operation, ParseOperationError};
use carrier_model::{
    CheckRequest, CheckResult, CreateRequest, CreateResult, DeleteRequest, DiffRequest, DiffResult,
    ReadRequest, ReadResult, UpdateRequest, UpdateResult,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::ResolveError;

const DESCRIBE: &str = "describe";

/// Resolves `exec` descriptors into bundles that shell out per operation.
#[derive(Debug, Clone, Default)]
pub struct ExecResolver {
    dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Description {
    operations: Vec<String>,
}

impl ExecResolver {
    /// `dir` is the base for relative program paths.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    fn locate(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        match &self.dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Run `describe` and build a bundle exposing exactly the listed operations.
    pub async fn resolve(
        &self,
        program: &str,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    ) -> Result<HandlerBundle, ResolveError> {
        let program = Arc::new(ExecProgram { path: self.locate(program), args, env });
        let name = program.path.display().to_string();

        let output = program
            .run(DESCRIBE, b"null")
            .await
            .map_err(|source| ResolveError::Spawn { program: name.clone(), source })?;
        if !output.status.success() {
            return Err(ResolveError::Describe {
                program: name,
                reason: failure_message(&output),
            });
        }
        let description: Description = serde_json::from_slice(&output.stdout)
            .map_err(|e| ResolveError::Describe { program: name.clone(), reason: e.to_string() })?;

        let mut bundle = HandlerBundle::new();
        for op in &description.operations {
            let op: Operation = op
                .parse()
                .map_err(|e: ParseOperationError| ResolveError::Describe {
                    program: name.clone(),
                    reason: e.to_string(),
                })?;
            bundle = match op {
                Operation::Check => bundle.with_check(slot::<CheckRequest, CheckResult>(&program, op)),
                Operation::Diff => bundle.with_diff(slot::<DiffRequest, DiffResult>(&program, op)),
                Operation::Create => bundle.with_create(slot::<CreateRequest, CreateResult>(&program, op)),
                Operation::Read => bundle.with_read(slot::<ReadRequest, ReadResult>(&program, op)),
                Operation::Update => bundle.with_update(slot::<UpdateRequest, UpdateResult>(&program, op)),
                Operation::Delete => bundle.with_delete(slot::<DeleteRequest, ()>(&program, op)),
            };
        }

        tracing::debug!(program = %name, operations = ?bundle.operations(), "Resolved exec handler");
        Ok(bundle)
    }
}

/// A resolved handler program.
#[derive(Debug)]
struct ExecProgram {
    path: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl ExecProgram {
    async fn run(&self, operation: &str, stdin: &[u8]) -> std::io::Result<std::process::Output> {
        let mut child = Command::new(&self.path)
            .args(&self.args)
            .arg(operation)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feed stdin while stdout and stderr drain, so neither side can fill
        // its pipe and stall the other.
        let input = child.stdin.take();
        let feed = async move {
            let Some(mut input) = input else {
                return Ok(());
            };
            match input.write_all(stdin).await {
                // The program is free to exit or close stdin without reading it.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                result => result,
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;
        Ok(output)
    }

    async fn invoke<Req, Resp>(&self, operation: Operation, request: &Req) -> Result<Resp, HandlerError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request).map_err(HandlerError::other)?;
        let output = self.run(operation.as_str(), &body).await.map_err(HandlerError::other)?;
        if !output.status.success() {
            return Err(HandlerError::Failed(failure_message(&output)));
        }

        let stdout = trim_ascii(&output.stdout);
        let stdout: &[u8] = if stdout.is_empty() { b"null" } else { stdout };
        serde_json::from_slice(stdout).map_err(|e| {
            HandlerError::Failed(format!(
                "{} {}: invalid JSON output: {}",
                self.path.display(),
                operation,
                e
            ))
        })
    }
}

/// Bind one operation of `program` as a bundle slot.
fn slot<Req, Resp>(
    program: &Arc<ExecProgram>,
    operation: Operation,
) -> impl Fn(Req) -> BoxFuture<Result<Resp, HandlerError>> + Send + Sync + 'static
where
    Req: Serialize + Send + Sync + 'static,
    Resp: DeserializeOwned + Send + 'static,
{
    let program = program.clone();
    move |request: Req| {
        let program = program.clone();
        Box::pin(async move { program.invoke(operation, &request).await })
            as BoxFuture<Result<Resp, HandlerError>>
    }
}

fn failure_message(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(trim_ascii(&output.stderr)).into_owned();
    if stderr.is_empty() {
        format!("handler program exited with {}", output.status)
    } else {
        stderr
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}
