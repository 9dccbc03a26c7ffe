use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pcm_ingest::{create_router, AppState, AudioFile, Config, FileSink, IngestService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "pcm-ingest", version, about = "Collect raw PCM uploads into WAV files")]
struct Cli {
    /// Config file (extension optional; missing file means defaults)
    #[arg(short, long, default_value = "config/pcm-ingest")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the format of a WAV file
    Inspect { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli.config).await,
        Command::Inspect { path } => inspect(&path),
    }
}

async fn serve(config_path: &str) -> Result<()> {
    let cfg = Config::load(config_path)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let output_dir = cfg.audio.output_path();
    let sink = FileSink::new(&output_dir)
        .await
        .with_context(|| format!("Failed to prepare output directory {:?}", output_dir))?;

    let service = Arc::new(
        IngestService::new(cfg.audio.ingest_options(), Arc::new(sink))
            .await
            .context("Failed to start ingest service")?,
    );

    let state = AppState::new(Arc::clone(&service))
        .with_max_body_bytes(cfg.service.http.max_body_bytes);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    service.shutdown().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

fn inspect(path: &Path) -> Result<()> {
    let audio = AudioFile::open(path)?;

    println!("{}", audio.path);
    println!("  Sample rate:     {} Hz", audio.sample_rate);
    println!("  Channels:        {}", audio.channels);
    println!("  Bits per sample: {}", audio.bits_per_sample);
    println!("  Byte rate:       {}", audio.header.byte_rate);
    println!("  Block align:     {}", audio.header.block_align);
    println!("  Data bytes:      {}", audio.header.data_len);
    println!("  Frames:          {}", audio.frames);
    println!("  Duration:        {:.2}s", audio.duration_seconds);

    Ok(())
}
