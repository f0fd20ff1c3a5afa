//! `phantasia-server`: runs a Phantasia server on one address.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use phantasia::{PhantasiaError, PhantasiaServer, load_game_config};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "phantasia-server")]
#[command(about = "Real-time multiplayer combat server")]
#[command(version)]
struct Args {
    /// Address to listen on. Defaults to 0.0.0.0 and the PORT variable.
    #[arg(long)]
    bind: Option<String>,

    /// Port used when --bind is not given.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// JSON file with game tuning overrides.
    #[arg(long)]
    game_config: Option<PathBuf>,

    /// Seed the dice for reproducible sessions.
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds a connection may stay silent before joining a room.
    #[arg(long)]
    idle_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), PhantasiaError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let bind = args
        .bind
        .unwrap_or_else(|| format!("0.0.0.0:{}", args.port));

    let mut builder = PhantasiaServer::builder().bind(&bind);
    if let Some(path) = &args.game_config {
        builder = builder.game_config(load_game_config(path)?);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if let Some(secs) = args.idle_timeout_secs {
        builder = builder.idle_timeout(Duration::from_secs(secs));
    }

    let server = builder.build().await?;
    match server.local_addr() {
        Ok(addr) => tracing::info!(%addr, "Phantasia server listening"),
        Err(e) => tracing::warn!(error = %e, "could not read local address"),
    }

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    }
}
