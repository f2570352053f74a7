use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use livecap::{
    Config, MicrophoneSource, SessionConfig, SessionController, SessionObserver, SessionStatus,
    Transcript,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "livecap", about = "Real-time microphone captioning client")]
struct Args {
    /// Config file path (extension resolved by the config loader)
    #[arg(short, long)]
    config: Option<String>,

    /// Transcription server origin, e.g. https://captions.example.com
    #[arg(short, long)]
    origin: Option<String>,
}

/// Prints interim results in place and committed paragraphs on their own line
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn status_changed(&self, status: SessionStatus) {
        match status {
            SessionStatus::Listening => info!("Listening"),
            SessionStatus::Processing => info!("Processing"),
        }
    }

    fn transcript_updated(&self, transcript: &Transcript) {
        if let Some(pending) = transcript.pending() {
            print!("\r{}", pending);
            std::io::stdout().flush().ok();
        } else if let Some(paragraph) = transcript.committed().last() {
            println!("\n{}", paragraph);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut session_config = match &args.config {
        Some(path) => Config::load(path)?.session_config(),
        None => SessionConfig::default(),
    };
    if let Some(origin) = args.origin {
        session_config.server_origin = origin;
    }

    info!("livecap v0.1.0");
    info!("Session: {}", session_config.session_id);
    info!("Server origin: {}", session_config.server_origin);

    let source = MicrophoneSource::new(session_config.capture_config());
    let controller = SessionController::new(session_config, Box::new(source))
        .with_observer(Arc::new(ConsoleObserver));

    controller.start().await?;
    info!("Recording. Press Ctrl-C to stop.");

    tokio::signal::ctrl_c().await?;

    // Mandatory cleanup path: releases the device and closes the connection
    let stats = controller.stop().await?;

    info!(
        "Session finished: {:.1}s, {} chunks sent, {} paragraphs",
        stats.duration_secs, stats.chunks_sent, stats.committed_paragraphs
    );

    let transcript = controller.transcript().await;
    if !transcript.is_empty() {
        println!("\n{}", transcript.render());
    }

    Ok(())
}
