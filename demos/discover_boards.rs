//! Basic example: Discover all nearby Adafruit boards
//!
//! Run with: cargo run --example discover_boards

use bluefruit_playground_ble::{BoardManager, Result};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bluefruit_playground_ble=debug".parse().unwrap()),
        )
        .init();

    println!("Starting Adafruit board discovery...");
    println!("Make sure your board runs the Bluefruit Playground firmware!\n");

    let manager = BoardManager::new().await?;

    let _handle = manager.on_board_discovered(|board| {
        println!("\nDiscovered board:");
        println!("  Identifier: {}", board.identifier());
        println!("  Model: {}", board.model());
        println!("  NeoPixels: {}", board.model().neopixel_count());
        println!("  RSSI: {:?} dBm", board.rssi());
    });

    manager.start_scanning().await?;

    println!("Scanning for 10 seconds...");
    tokio::time::sleep(Duration::from_secs(10)).await;

    println!("\n=== Summary ===");
    for board in manager.boards_by_signal() {
        println!(
            "{} {} ({:?} dBm)",
            board.model(),
            board.identifier(),
            board.rssi()
        );
    }
    if let Some(nearest) = manager.nearest_board() {
        println!("Nearest: {}", nearest.identifier());
    } else {
        println!("No boards found");
    }

    manager.shutdown().await?;
    Ok(())
}
