//! Binary crate for the `rainfall` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Serving the HTTP endpoints and landing page

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod browser;
mod cli;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional; a missing .env is not an error.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rainfall=info,rainfall_core=info,tower_http=info".into()),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
