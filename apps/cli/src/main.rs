//! Fluentra command-line uploader.
//!
//! Stands in for the web presentation layer: picks a recording, drives
//! the upload engine, and renders progress events.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use fluentra_api_client::ApiClient;
use fluentra_upload::{RateWindow, UploadEvent, UploadTarget, Uploader};

/// Uploads a speech recording to the Fluentra ingestion API.
#[derive(Debug, Parser)]
#[command(name = "fluentra", version, about)]
struct Args {
    /// Audio file to upload (mp3, wav or m4a).
    file: PathBuf,

    /// Base URL of the ingestion API.
    #[arg(
        long,
        env = "FLUENTRA_API_URL",
        default_value = "http://localhost:3001/api"
    )]
    server: String,

    /// Bearer token for authenticated uploads.
    #[arg(long, env = "FLUENTRA_API_TOKEN")]
    token: Option<String>,

    /// Chunk size in bytes (default 1 MiB).
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Override the MIME type inferred from the file extension.
    #[arg(long)]
    mime_type: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let target = match &args.mime_type {
        Some(mime) => UploadTarget::with_mime_type(&args.file, mime),
        None => UploadTarget::from_path(&args.file),
    }
    .with_context(|| format!("cannot use {} as an upload source", args.file.display()))?;

    tracing::info!(
        file = %target.name,
        bytes = target.size_bytes,
        mime = %target.mime_type,
        "starting upload"
    );

    let client = ApiClient::new(&args.server, args.token.as_deref())
        .context("failed to build API client")?;

    let mut uploader = Uploader::new(&client);
    if let Some(chunk_size) = args.chunk_size {
        uploader = uploader.with_chunk_size(chunk_size);
    }

    // Ctrl-C stops the transfer between chunks.
    let cancel = uploader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling upload");
            cancel.cancel();
        }
    });

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let printer = tokio::spawn(async move {
        let mut rate = RateWindow::new(Duration::from_secs(5));
        let mut last_bytes = 0u64;
        while let Some(event) = events_rx.recv().await {
            match event {
                UploadEvent::Progress(p) => {
                    rate.record(p.bytes_uploaded - last_bytes);
                    last_bytes = p.bytes_uploaded;
                    let speed = rate.bytes_per_second() / (1024.0 * 1024.0);
                    let eta = rate
                        .eta(p.total_bytes - p.bytes_uploaded)
                        .map(|d| format!("{}s", d.as_secs()))
                        .unwrap_or_else(|| "--".into());
                    println!(
                        "chunk {}/{}  {:>5.1}%  {:.2} MiB/s  eta {}",
                        p.current_chunk, p.total_chunks, p.percentage, speed, eta
                    );
                }
                UploadEvent::Completed { upload_id } => {
                    println!("upload complete: {upload_id}");
                }
                UploadEvent::Failed { error } => {
                    eprintln!("upload failed: {error}");
                }
            }
        }
    });

    let result = uploader.upload(&target, &events_tx).await;
    drop(events_tx);
    let _ = printer.await;

    let result = result?;
    tracing::info!(upload_id = %result.upload_id, "recording queued for analysis");
    Ok(())
}
