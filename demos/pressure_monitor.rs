//! Barometric pressure monitor example
//!
//! Connects to the nearest board, starts a pressure screen and prints the
//! gauge state as readings arrive.
//!
//! Run with: cargo run --example pressure_monitor
//!
//! Without hardware:
//!   cargo run --example pressure_monitor -- --simulate

use bluefruit_playground_ble::{
    Board, BoardConfig, BoardManager, BoardModel, BoardService, Error, PressureScreen,
    PressureView, Result, SimulatedBoard,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("warn,bluefruit_playground_ble=info")
        .init();

    println!("Barometric Pressure Monitor");
    println!("===========================\n");

    let simulate = std::env::args().any(|arg| arg == "--simulate");

    let config = BoardConfig::default().with_services([BoardService::BarometricPressure]);

    let (manager, simulation) = if simulate {
        let board = Arc::new(Board::detached(
            "simulated",
            BoardModel::CircuitPlaygroundBluefruit,
            config,
        ));
        let simulation = SimulatedBoard::new(board.clone());
        simulation.start();
        (BoardManager::with_current(board), Some(simulation))
    } else {
        let manager = BoardManager::with_config(config).await?;
        manager.start_scanning().await?;

        println!("Looking for boards...");
        tokio::time::sleep(Duration::from_secs(5)).await;
        manager.stop_scanning().await?;

        let board = manager.nearest_board().ok_or_else(|| Error::BoardNotFound {
            identifier: "any".to_string(),
        })?;
        println!("Connecting to {} {}...", board.model(), board.identifier());
        manager.start_board(board).await?;
        (manager, None)
    };

    let screen = PressureScreen::for_current_board(&manager, PressureView::default());
    screen.start()?;

    for _ in 0..30 {
        let state = screen.render_state();
        println!(
            "{:>6} hPa  needle {:>7.1}°  [{}{}]",
            state.label,
            state.needle.degrees,
            "#".repeat((state.needle.progress * 40.0) as usize),
            " ".repeat(40 - (state.needle.progress * 40.0) as usize),
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    println!("\nChart holds {} points", screen.chart_points().len());
    screen.stop();

    if let Some(simulation) = simulation {
        simulation.stop().await;
    }
    manager.shutdown().await?;
    Ok(())
}
