use anyhow::Result;
use clap::Parser;
use engine::persist::{load_snapshot, IndexPaths};
use engine::{Engine, IdfMode};
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Snapshot directory; loaded at startup if a snapshot exists there
    #[arg(long, default_value = "./index")]
    index: String,
    /// Use the smoothed IDF formula ln((N+1)/(DF+1)) + 1 for a fresh engine
    /// (a loaded snapshot keeps the mode it was saved with)
    #[arg(long, default_value_t = false)]
    smoothed_idf: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index_dir = PathBuf::from(&args.index);
    let paths = IndexPaths::new(&index_dir);
    let engine = match load_snapshot(&paths) {
        Ok(engine) => {
            tracing::info!(dir = %index_dir.display(), "loaded snapshot");
            engine
        }
        Err(_) => {
            let mode = if args.smoothed_idf { IdfMode::Smoothed } else { IdfMode::Standard };
            tracing::info!(?mode, "starting with an empty engine");
            Engine::new(mode)
        }
    };

    let app = build_app(Arc::new(engine), index_dir);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
