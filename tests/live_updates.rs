//! Live update behavior across the board session and module screens.

use bluefruit_playground_ble::{
    Board, BoardConfig, BoardManager, BoardModel, Error, PressureScreen, PressureView,
    SensorKind, SensorReading, SimulatedBoard,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

fn board() -> Arc<Board> {
    Arc::new(Board::detached(
        "integration",
        BoardModel::CircuitPlaygroundBluefruit,
        BoardConfig::default(),
    ))
}

#[test]
fn no_reading_renders_placeholder_at_minimum() {
    let board = board();
    let screen = PressureScreen::new(Some(board), PressureView::default());
    screen.start().unwrap();

    let state = screen.render_state();
    assert_eq!(state.label, "--");
    assert_eq!(state.needle.progress, 0.0);
    assert_eq!(state.needle.degrees, -136.0);
    assert!(screen.chart_points().is_empty());
}

#[test]
fn midpoint_pressure_centers_the_needle() {
    let board = board();
    let screen = PressureScreen::new(Some(board.clone()), PressureView::default());
    screen.start().unwrap();

    board.publish_pressure(1010.0);
    let state = screen.render_state();
    assert_eq!(state.label, "1010");
    assert_eq!(state.needle.progress, 0.5);
    assert!(state.needle.degrees.abs() < 1e-4);
}

#[test]
fn render_twice_is_idempotent() {
    let board = board();
    board.publish_pressure(1000.0);
    let screen = PressureScreen::new(Some(board), PressureView::default());
    screen.start().unwrap();

    let first = screen.render_state();
    let second = screen.render_state();
    assert_eq!(first, second);

    screen.stop();
    screen.start().unwrap();
    assert_eq!(screen.render_state(), first);
}

#[test]
fn second_screen_is_rejected_while_first_holds_the_slot() {
    let board = board();
    let a = PressureScreen::new(Some(board.clone()), PressureView::default());
    let b = PressureScreen::new(Some(board.clone()), PressureView::default());

    a.start().unwrap();
    let result = b.start();
    assert!(matches!(
        result,
        Err(Error::LiveSlotOccupied {
            sensor: SensorKind::BarometricPressure,
            ..
        })
    ));

    board.publish_pressure(1020.0);
    assert_eq!(a.render_state().label, "1020");
    assert_eq!(b.render_state().label, "--");
}

#[test]
fn take_over_routes_updates_to_the_new_screen() {
    let board = board();
    let a = PressureScreen::new(Some(board.clone()), PressureView::default());
    let b = PressureScreen::new(Some(board.clone()), PressureView::default());

    a.start().unwrap();
    b.start_taking_over().unwrap();

    board.publish_pressure(1030.0);
    assert_eq!(b.render_state().label, "1030");
    assert_eq!(a.render_state().label, "--");

    // A's late release leaves B in place
    a.stop();
    board.publish_pressure(1040.0);
    assert_eq!(b.render_state().label, "1040");
    assert!(board.pressure().has_live_owner());
}

#[test]
fn no_callback_after_stop() {
    let board = board();
    let screen = PressureScreen::new(Some(board.clone()), PressureView::default());
    screen.start().unwrap();
    board.publish_pressure(1001.0);
    screen.stop();

    board.publish_pressure(1050.0);
    assert_eq!(screen.render_state().label, "1001");
    assert!(!board.pressure().has_live_owner());

    // The board still caches the value and series
    assert_eq!(board.pressure().last_value(), Some(1050.0));
    assert_eq!(board.pressure().series().len(), 2);
}

#[test]
fn no_callback_after_stop_across_threads() {
    let board = board();
    let delivered = Arc::new(AtomicUsize::new(0));
    let first_delivery = Arc::new(Barrier::new(2));

    let counter = delivered.clone();
    let barrier = first_delivery.clone();
    let handle = board
        .pressure()
        .claim_live(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                barrier.wait();
            }
        })
        .unwrap();

    let publisher = {
        let board = board.clone();
        std::thread::spawn(move || {
            for i in 0..2000 {
                board.publish_pressure(1000.0 + (i % 50) as f32);
            }
        })
    };

    // Release while the publisher is mid-stream
    first_delivery.wait();
    drop(handle);
    let after_release = delivered.load(Ordering::SeqCst);
    assert!(after_release >= 1);

    publisher.join().unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), after_release);
    assert!(!board.pressure().has_live_owner());
}

#[test]
fn chart_follows_series_appends() {
    let board = board();
    let screen = PressureScreen::new(Some(board.clone()), PressureView::default());
    screen.start().unwrap();

    for p in [990.0, 995.0, 1000.0] {
        board.publish_pressure(p);
    }
    let ys: Vec<f64> = screen.chart_points().iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![990.0, 995.0, 1000.0]);

    board.reset_series();
    board.publish_pressure(1005.0);
    let ys: Vec<f64> = screen.chart_points().iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![1005.0]);
}

#[tokio::test]
async fn simulated_session_feeds_current_board() {
    let board = board();
    let manager = BoardManager::with_current(board.clone());
    let simulation = SimulatedBoard::with_period(board.clone(), Duration::from_millis(5));

    let mut readings = board.subscribe_readings();
    let screen = PressureScreen::for_current_board(&manager, PressureView::default());
    screen.start().unwrap();
    simulation.start();

    let reading = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(SensorReading::BarometricPressure(p)) = readings.recv().await {
                return p;
            }
        }
    })
    .await
    .unwrap();
    assert!(reading > 990.0 && reading < 1030.0);

    simulation.stop().await;
    assert_ne!(screen.render_state().label, "--");
    assert!(!screen.chart_points().is_empty());

    manager.shutdown().await.unwrap();
}

#[test]
fn switching_boards_moves_screens_to_the_new_current_board() {
    let first = board();
    let second = Arc::new(Board::detached(
        "second",
        BoardModel::Clue,
        BoardConfig::default(),
    ));
    let manager = BoardManager::with_current(first.clone());

    tokio_test::block_on(manager.start_board(second.clone())).unwrap();
    let current = manager.current_board().unwrap();
    assert!(Arc::ptr_eq(&current, &second));

    let screen = PressureScreen::for_current_board(&manager, PressureView::default());
    screen.start().unwrap();
    first.publish_pressure(1000.0);
    assert_eq!(screen.render_state().label, "--");
    second.publish_pressure(1020.0);
    assert_eq!(screen.render_state().label, "1020");

    // Starting the current board again changes nothing
    tokio_test::block_on(manager.start_board(second.clone())).unwrap();
    assert!(screen.is_started());

    screen.stop();
    tokio_test::block_on(manager.stop_current_board()).unwrap();
    assert!(manager.current_board().is_none());
}
