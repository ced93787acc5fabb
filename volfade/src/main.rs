//! volfade - Main entry point
//!
//! `volfade serve` runs the HTTP fade service; `volfade fade` fades one
//! configured player and exits.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use volfade::api::{self, AppState};
use volfade::device::{PlayerDirectory, PlayerRef};
use volfade::fade::{FadeOutcome, FadeRegistry, FadeRequest};
use volfade_common::config::TomlConfig;
use volfade_common::events::EventBus;

/// Command-line arguments for volfade
#[derive(Parser, Debug)]
#[command(name = "volfade")]
#[command(about = "Volume fade controller for media players")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "VOLFADE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, env = "VOLFADE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP fade service (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "VOLFADE_PORT")]
        port: Option<u16>,
    },

    /// Fade one player and exit
    Fade {
        /// Configured player name
        #[arg(short, long)]
        player: String,

        /// Target volume, 0.0-1.0
        #[arg(short, long)]
        volume: Option<f32>,

        /// Duration in seconds, 0.1-60
        #[arg(short, long)]
        duration: Option<f64>,

        /// linear, bezier or logarithmic
        #[arg(long)]
        curve: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_path) = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("volfade={level},volfade_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    let directory = PlayerDirectory::from_config(&config.players, &config.http)
        .context("Failed to build player directory")?;
    if directory.is_empty() {
        warn!("No players configured");
    }
    let registry = FadeRegistry::new(directory, EventBus::new(100));

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.port);
            serve(registry, config, port).await
        }
        Command::Fade {
            player,
            volume,
            duration,
            curve,
        } => {
            let request =
                FadeRequest::from_parts(volume, duration, curve.as_deref(), &config.defaults)?;
            fade_once(registry, PlayerRef::from(player), request).await
        }
    }
}

/// Run the HTTP API until Ctrl+C / SIGTERM
async fn serve(registry: FadeRegistry, config: TomlConfig, port: u16) -> Result<()> {
    info!("Starting volfade on port {}", port);

    let state = AppState {
        registry: registry.clone(),
        defaults: config.defaults,
        port,
    };
    let app = api::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let cancelled = registry.cancel_all();
    if cancelled > 0 {
        info!("Cancelled {} active fade(s)", cancelled);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Fade one player; Ctrl+C cancels the fade (no finalize write)
async fn fade_once(registry: FadeRegistry, player: PlayerRef, request: FadeRequest) -> Result<()> {
    let handle = registry.start(player.clone(), request)?;
    let wait = handle.wait();
    tokio::pin!(wait);

    let result = tokio::select! {
        outcome = &mut wait => outcome,
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, cancelling fade");
            registry.cancel(&player);
            wait.await
        }
    };
    let outcome = result.with_context(|| format!("Fade on {} failed", player))?;

    match outcome {
        FadeOutcome::Completed {
            stop,
            plan,
            setpoints_written,
        } => info!(
            player = %player,
            start_volume = plan.start_volume,
            target_volume = plan.target_volume,
            reason = %stop,
            setpoints_written,
            "Fade finished"
        ),
        FadeOutcome::Cancelled {
            setpoints_written, ..
        } => warn!(player = %player, setpoints_written, "Fade cancelled before finishing"),
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
