//! wirechat TUI entry point.

use std::{fs::File, sync::Mutex, time::Duration};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wirechat_app::{AppConfig, Runtime};
use wirechat_client::transport::{self, TransportConfig};
use wirechat_tui::TerminalDriver;

/// wirechat terminal client
#[derive(Parser, Debug)]
#[command(name = "wirechat-tui")]
#[command(about = "Terminal client for line-oriented WebSocket chat servers")]
#[command(version)]
struct Args {
    /// Label for your own lines in the transcript (defaults to your name)
    #[arg(long)]
    self_label: Option<String>,

    /// Seconds to wait for the WebSocket handshake
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Log file (the terminal itself is owned by the UI)
    #[arg(long, default_value = "wirechat.log")]
    log_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_file = File::create(&args.log_file)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(log_file)).with_ansi(false))
        .with(filter)
        .init();

    transport::install_crypto_provider();

    let config = TransportConfig {
        connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        ..TransportConfig::default()
    };
    let driver = TerminalDriver::new(config)?;

    tracing::info!("wirechat starting");
    Runtime::new(driver, AppConfig { self_label: args.self_label }).run().await?;
    tracing::info!("wirechat stopped");

    Ok(())
}
