//! Exercise a CFA635 module behind a TCP serial bridge.
//!
//! Usage: cargo run --example hello -- 192.168.1.50:4001

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cfa635_driver::{Cfa635Client, DriverConfig, Marquee};
use clap::Parser;

/// Exercise a CFA635 module behind a TCP serial bridge.
#[derive(Parser)]
#[command(name = "hello")]
struct Cli {
    /// Bridge address, e.g. 192.168.1.50:4001
    addr: String,

    /// Driver config file (toml); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => DriverConfig::load(path)?,
        None => DriverConfig::default(),
    };

    println!("Connecting to {}", cli.addr);
    println!("======================================");
    let client = Arc::new(Cfa635Client::connect(&cli.addr, config).await?);

    println!("\n[1] Pinging...");
    client.ping(b"hello").await?;
    println!("    Module answered.");

    println!("\n[2] Reading version...");
    let version = client.version().await?;
    println!("    {version}");

    println!("\n[3] Writing a greeting...");
    client.clear_screen().await?;
    client.set_backlight(80).await?;
    client.write_text(0, 0, "CFA635 driver").await?;
    client.write_text(0, 1, "says hello!").await?;

    println!("\n[4] Scrolling a marquee for 10 seconds...");
    let marquee = Marquee::start(
        Arc::clone(&client),
        3,
        "The quick brown fox jumps over the lazy dog",
        Duration::from_millis(250),
    )?;
    tokio::time::sleep(Duration::from_secs(10)).await;
    marquee.stop().await;

    println!("\n[5] Shutting down.");
    client.shutdown().await;

    println!("\n======================================");
    println!("Done!");

    Ok(())
}
