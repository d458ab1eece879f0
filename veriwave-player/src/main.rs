//! Veriwave Player - Main entry point
//!
//! Local playback-review service: loads one audio recording plus its
//! synthetic-speech analysis report and exposes exclusive playback control
//! over HTTP with an SSE event stream.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veriwave_player::api;
use veriwave_player::config::ServiceConfig;

/// Command-line arguments for veriwave-player
#[derive(Parser, Debug)]
#[command(name = "veriwave-player")]
#[command(about = "Playback-review service for analyzed recordings")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "VERIWAVE_PORT")]
    port: Option<u16>,

    /// Recording to load at startup (requires --analysis)
    #[arg(short, long, env = "VERIWAVE_MEDIA")]
    media: Option<PathBuf>,

    /// Analysis report JSON to load at startup (requires --media)
    #[arg(short, long, env = "VERIWAVE_ANALYSIS")]
    analysis: Option<PathBuf>,

    /// Optional TOML config file with port and tuning overrides
    #[arg(short, long, env = "VERIWAVE_CONFIG")]
    config: Option<PathBuf>,

    /// Use the stricter 0.4 score threshold for segment display
    #[arg(long)]
    conservative: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "veriwave_player=debug,veriwave_common=debug,tower_http=debug".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = ServiceConfig::resolve(args.config.as_deref(), args.port, args.conservative)
        .context("Failed to resolve configuration")?;

    info!("Starting veriwave player on port {}", config.port);

    let ctx = api::AppContext::new(config.tuning.clone());

    // Optional initial session from the command line
    match (&args.media, &args.analysis) {
        (Some(media), Some(analysis)) => {
            let session = api::load_session(&ctx, media, analysis)
                .await
                .context("Failed to load initial session")?;
            info!(
                "Loaded {} ({:.2}s, {} segments)",
                media.display(),
                session.duration_secs(),
                session.segments().len()
            );
        }
        (None, None) => {
            info!("No initial media; waiting for POST /session");
        }
        _ => bail!("--media and --analysis must be given together"),
    }

    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
