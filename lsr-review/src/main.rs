//! lsr-review - Lab Safety Review annotation service
//!
//! Serves the review API for one reviewer: load a generated lab-safety
//! dataset, step through its items, record judgements. Every edit is
//! written to `<data_dir>/<name>/<name>_annotation.json` immediately.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use lsr_review::api::BuildInfo;
use lsr_review::{build_router, AppState};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "lsr-review", version, about = "Lab safety dataset review service")]
struct Args {
    /// Config file (overrides LSR_CONFIG and ~/.config/lsr/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder holding annotation files (overrides config)
    #[arg(long, env = "LSR_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "LSR_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Listen port
    #[arg(long, env = "LSR_PORT", default_value_t = 5740)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any I/O
    info!("Starting Lab Safety Review (lsr-review) {}", BuildInfo::CURRENT);

    let args = Args::parse();

    let mut config = lsr_common::config::load_config(args.config.as_deref());
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    std::fs::create_dir_all(&config.data_dir)?;
    info!("Data folder: {}", config.data_dir.display());

    if config.refiner.api_key.is_none() {
        info!("Refinement API key not set; /api/refine will report it as unconfigured");
    }
    if !config.backup.has_credentials() {
        info!("Backup credentials not set; /api/backup will report them as unconfigured");
    }

    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("lsr-review listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
