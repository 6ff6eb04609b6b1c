use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use vcontext::config::ServerConfig;
use vcontext::handlers;
use vcontext::server::{ServeError, Server};
use vcontext::store::ContextStore;

/// Context store for AI agents, served as JSON-RPC 2.0 over stdio.
#[derive(Parser, Debug)]
#[command(name = "vcontext")]
#[command(version)]
struct Args {
    /// Path to the SQLite database (overrides VCONTEXT_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = ServerConfig::resolve(args.db);

    let store = match ContextStore::open(&config.db_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(path = %config.db_path.display(), "failed to open db: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(path = %config.db_path.display(), "vcontext {} ready", env!("CARGO_PKG_VERSION"));

    let server = Server::new(handlers::registry(store));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match server.serve_stdio(&cancel).await {
        Ok(()) | Err(ServeError::Cancelled) => tracing::info!("server stopped"),
        Err(e) => {
            tracing::error!("server stopped: {e}");
            std::process::exit(1);
        }
    }
}
