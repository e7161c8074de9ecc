use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crop_advisor::{Advisor, Config, Function, FunctionName, GeminiClient, Standalone, TransportAdapter};

/// Crop recommendation and plant disease advisory service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file (default: ~/.cropadvisor/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve a single function at "/" instead of the full API
    /// (crop-recommendation or disease-prediction)
    #[arg(long)]
    function: Option<FunctionName>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut config = Config::resolve(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let api_key = config.require_api_key()?.to_string();
    let model = GeminiClient::new(&api_key, &config)
        .map_err(anyhow::Error::msg)
        .context("Failed to create Gemini client")?;

    let adapter: Box<dyn TransportAdapter> = match args.function {
        Some(name) => Box::new(Function(name)),
        None => Box::new(Standalone),
    };

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, config.port))?;

    let advisor = Advisor::new(Arc::new(model), Arc::new(config));
    let app = adapter.router(advisor);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on {} ({})", addr, adapter.name());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
