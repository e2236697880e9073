//! Carrier Daemon (`carrierd`)
//!
//! Provider process for dynamic resources. Speaks newline-delimited JSON on
//! stdin/stdout and logs to stderr. Exits when stdin closes or on SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use carrier_provider::{DynamicProvider, ProviderConfig};
use carrier_rpc::RpcServer;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "carrierd", version, about = "Carrier dynamic resource provider")]
struct Args {
    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Accept handlers implemented by external programs
    #[arg(long)]
    allow_exec: bool,

    /// Base directory for relative exec handler programs
    #[arg(long, env = "CARRIER_EXEC_DIR", value_name = "DIR")]
    exec_dir: Option<PathBuf>,

    /// Version reported to the orchestrator
    #[arg(long, value_name = "VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    provider_version: String,
}

impl Args {
    fn provider_config(&self) -> ProviderConfig {
        let config = ProviderConfig::new(&self.provider_version);
        if self.allow_exec {
            config.allow_exec(self.exec_dir.clone())
        } else {
            config
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.provider_config();
    if !config.exec.enabled && args.exec_dir.is_some() {
        tracing::warn!("--exec-dir has no effect without --allow-exec");
    }

    let provider = DynamicProvider::builder().config(config.clone()).build();
    tracing::info!(
        version = %provider.version(),
        exec = config.exec.enabled,
        "carrierd starting"
    );

    let server = RpcServer::new(Arc::new(provider));
    tokio::select! {
        result = server.serve(tokio::io::stdin(), tokio::io::stdout()) => {
            result.map_err(|e| {
                tracing::error!("Server error: {}", e);
                anyhow::anyhow!(e)
            })?;
            tracing::info!("Input closed");
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received...");
        }
    }

    tracing::info!("carrierd stopped");
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();

    // Only apply defaults if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        if let Ok(directive) = level.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (sigint, sigterm) = match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to install signal handlers: {}", e);
                return std::future::pending().await;
            }
        };
        let (mut sigint, mut sigterm) = (sigint, sigterm);
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
