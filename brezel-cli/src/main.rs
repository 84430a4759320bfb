//! `brezel`: query a Brezel system from the command line.
//!
//! Usage:
//!   brezel --api-url https://api.brezel.io --system acme list tickets --filters '{"status":"open"}'
//!
//! Connection settings fall back to `BREZEL_API_URL`, `BREZEL_SYSTEM`,
//! `BREZEL_API_KEY`, `BREZEL_TOKEN` and `BREZEL_SHARE_URL`.

use anyhow::{Context, Result};
use brezel_cli::{Args, run};
use brezel_client::Client;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let client = Client::new(args.client_config()).context("invalid client configuration")?;
    let output = run(&client, &args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
