//! Offline corpus precompute
//!
//! Builds the two knowledge-base snapshots from a corpus directory: the
//! embedded chunk snapshot the server retrieves against, and the raw
//! full-text snapshot that, when enabled, is served verbatim. PDF text
//! extraction happens here so the server never has to parse PDFs.
//!
//! Run with: cargo run -p docqa --bin docqa-precompute

use std::path::{Path, PathBuf};

use base64::Engine as _;
use clap::Parser;
use sha2::{Digest, Sha256};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docqa::config::AppConfig;
use docqa::corpus::extract::{self, PRECOMPUTE_EXTENSIONS};
use docqa::corpus::{Chunker, CorpusLoader};
use docqa::kb;
use docqa::kb::raw::{RawFile, RawSnapshot, RAW_SNAPSHOT_VERSION};
use docqa::providers::OpenAiClient;

#[derive(Parser, Debug)]
#[command(
    name = "docqa-precompute",
    version,
    about = "Precompute knowledge-base snapshots"
)]
struct Args {
    /// Path to a TOML configuration file (falls back to ./docqa.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Corpus directory override
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Skip the embedded chunk snapshot
    #[arg(long)]
    no_embedded: bool,

    /// Skip the raw full-text snapshot
    #[arg(long)]
    no_raw: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(corpus) = args.corpus {
        config.corpus.dir = corpus;
    }

    if !args.no_embedded && std::env::var("OPENAI_API_KEY").unwrap_or_default().is_empty() {
        anyhow::bail!("OPENAI_API_KEY is required to embed the corpus");
    }

    let loader = CorpusLoader::new(&config.corpus.dir).with_extensions(PRECOMPUTE_EXTENSIONS);
    let names = loader.list();
    if names.is_empty() {
        anyhow::bail!(
            "no supported files found in {}",
            config.corpus.dir.display()
        );
    }
    tracing::info!(
        files = names.len(),
        dir = %config.corpus.dir.display(),
        "corpus enumerated"
    );

    if !args.no_embedded {
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let client = OpenAiClient::new(config.provider.clone());
        tracing::info!(model = %config.provider.embed_model, "embedding corpus");
        let snapshot = kb::build_snapshot(
            &loader,
            &chunker,
            &client,
            config.provider.embed_concurrency,
        )
        .await?;
        tracing::info!(chunks = snapshot.chunks.len(), "embedding snapshot built");
        snapshot.save(&config.corpus.cache_path);
    }

    if !args.no_raw {
        let snapshot = build_raw_snapshot(&loader, &names)?;
        snapshot.save(&config.corpus.raw_path);
    }

    Ok(())
}

/// Bake every corpus file into the raw snapshot. A PDF that fails to parse
/// aborts the build; a text file that fails to decode is recorded with
/// empty text.
fn build_raw_snapshot(loader: &CorpusLoader, names: &[String]) -> anyhow::Result<RawSnapshot> {
    let mut files = Vec::with_capacity(names.len());
    for name in names {
        let data = loader.read_bytes(name)?;
        let sha256 = hex::encode(Sha256::digest(&data));
        let bytes_b64 = base64::engine::general_purpose::STANDARD.encode(&data);
        let file_type = extract::extension_of(Path::new(name)).unwrap_or_default();

        let (text, num_pages) = if file_type == "pdf" {
            let extracted = extract::extract(name, &data)?;
            (extracted.text, extracted.num_pages)
        } else {
            match extract::extract(name, &data) {
                Ok(extracted) => (extracted.text, None),
                Err(e) => {
                    tracing::warn!("could not read {} as text: {}", name, e);
                    (String::new(), None)
                }
            }
        };

        files.push(RawFile {
            name: name.clone(),
            file_type,
            size: data.len() as u64,
            sha256,
            bytes_b64,
            text,
            num_pages,
        });
    }

    Ok(RawSnapshot {
        version: RAW_SNAPSHOT_VERSION,
        source_files: loader.fingerprints()?,
        files,
    })
}
