//! Main entry point for the monday.com SDK demo driver.

use clap::Parser;
use monday_cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "monday_sdk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = monday_cli::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
