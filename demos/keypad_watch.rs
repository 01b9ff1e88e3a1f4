//! Watch keypad activity until interrupted.
//!
//! Usage: cargo run --example keypad_watch -- 192.168.1.50:4001

use cfa635_driver::{Cfa635Client, DriverConfig};
use clap::Parser;

/// Print keypad events from a CFA635 module as they arrive.
#[derive(Parser)]
#[command(name = "keypad_watch")]
struct Cli {
    /// Bridge address, e.g. 192.168.1.50:4001
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = Cfa635Client::connect(&cli.addr, DriverConfig::default()).await?;

    let held = client.poll_keys().await?;
    if held.is_empty() {
        println!("No key held at startup");
    } else {
        println!("Key state mask at startup: {:#04X}", held.bits());
    }

    let _observer = client.on_key_event(|event| println!("  {event}"));

    println!("Watching keypad, press Ctrl-C to exit...");
    tokio::signal::ctrl_c().await?;

    client.shutdown().await;
    Ok(())
}
