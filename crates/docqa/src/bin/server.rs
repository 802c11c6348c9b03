//! Document QA server binary
//!
//! Run with: cargo run -p docqa --bin docqa-server

use std::path::PathBuf;

use clap::Parser;
use docqa::{config::AppConfig, server::ChatServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docqa-server", version, about = "Document question-answering server")]
struct Args {
    /// Path to a TOML configuration file (falls back to ./docqa.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Corpus directory: {}", config.corpus.dir.display());
    tracing::info!("  - Embedding model: {}", config.provider.embed_model);
    tracing::info!(
        "  - Model candidates: {}",
        config.provider.model_candidates.join(", ")
    );
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - Top K: {}", config.retrieval.top_k);

    if std::env::var("OPENAI_API_KEY").unwrap_or_default().is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; upstream calls will be rejected");
    }

    let server = ChatServer::new(config);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/chat        - Ask a question");
    println!("  POST /api/chat-stream - Ask a question, streamed");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
