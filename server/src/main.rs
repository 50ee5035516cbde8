use anyhow::Result;
use clap::{Parser, ValueEnum};
use sift_core::{ScoringMode, SearchConfig};
use sift_server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sift-server", about = "Serve boolean TF-IDF queries over HTTP")]
struct Args {
    /// Index directory written by `sift-indexer build`
    #[arg(long, default_value = "./index")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Results per query when the request gives no `k`
    #[arg(long, default_value_t = 10)]
    limit: usize,
    /// Scoring mode when the request gives none
    #[arg(long, value_enum, default_value_t = Scoring::Restricted)]
    scoring: Scoring,
}

#[derive(Clone, Copy, ValueEnum)]
enum Scoring {
    Restricted,
    CorpusWide,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let scoring = match args.scoring {
        Scoring::Restricted => ScoringMode::Restricted,
        Scoring::CorpusWide => ScoringMode::CorpusWide,
    };
    let app = build_app(&args.index, SearchConfig { limit: args.limit, scoring })?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
