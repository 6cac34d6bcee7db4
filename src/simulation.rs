//! Simulated board.
//!
//! Feeds a detached [`Board`] with smoothly varying readings at the sensor
//! period, so screens and demos run without hardware.

use parking_lot::Mutex;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::board::Board;
use crate::data::{
    AccelerometerValue, ButtonState, ButtonsState, ColorValue, GyroscopeValue, MagnetometerValue,
    QuaternionValue, SlideSwitch, SoundAmplitudes,
};
use crate::sensor::{SensorKind, SensorReading, DEFAULT_SENSOR_PERIOD};

/// Ticks per full cycle of the slow waveforms.
const CYCLE_TICKS: f32 = 200.0;

fn wave(tick: u64, period_ticks: f32, phase: f32) -> f32 {
    ((tick as f32 / period_ticks) * TAU + phase).sin()
}

/// Readings for one tick.
///
/// Values are a pure function of `tick`. Buttons are only emitted when they
/// change.
pub fn sample(tick: u64) -> Vec<SensorReading> {
    let slow = |phase| wave(tick, CYCLE_TICKS, phase);
    let fast = |phase| wave(tick, CYCLE_TICKS / 8.0, phase);

    let mut readings = vec![
        SensorReading::BarometricPressure(1013.0 + 12.0 * slow(0.0)),
        SensorReading::Temperature(22.0 + 3.0 * slow(1.0)),
        SensorReading::Humidity(45.0 + 15.0 * slow(2.0)),
        SensorReading::Light(300.0 + 250.0 * slow(3.0)),
        SensorReading::Sound(SoundAmplitudes::new(vec![f64::from(-60.0 + 25.0 * fast(0.0))])),
        SensorReading::Accelerometer(AccelerometerValue::new(
            3.0 * slow(0.5),
            4.0 * fast(1.5),
            9.0,
        )),
        SensorReading::Gyroscope(GyroscopeValue {
            x: 0.2 * fast(0.0),
            y: 0.2 * fast(1.0),
            z: 0.2 * fast(2.0),
        }),
        SensorReading::Magnetometer(MagnetometerValue {
            x: 30.0 * slow(0.0),
            y: 30.0 * slow(1.57),
            z: -40.0,
        }),
        SensorReading::Color(ColorValue {
            red: 0.5 + 0.5 * slow(0.0),
            green: 0.5 + 0.5 * slow(2.1),
            blue: 0.5 + 0.5 * slow(4.2),
        }),
    ];

    let half_angle = tick as f32 / CYCLE_TICKS * TAU / 2.0;
    readings.push(SensorReading::Quaternion(QuaternionValue::new(
        0.0,
        half_angle.sin(),
        0.0,
        half_angle.cos(),
    )));

    if tick == 0 || buttons_at(tick) != buttons_at(tick - 1) {
        readings.push(SensorReading::Buttons(buttons_at(tick)));
    }

    readings
}

fn buttons_at(tick: u64) -> ButtonsState {
    let pressed = |on: bool| if on { ButtonState::Pressed } else { ButtonState::Released };
    ButtonsState {
        slide_switch: if (tick / 100) % 2 == 0 {
            SlideSwitch::Right
        } else {
            SlideSwitch::Left
        },
        button_a: pressed(tick % 40 < 3),
        button_b: pressed((tick + 20) % 60 < 3),
    }
}

/// Drives a board with simulated readings.
pub struct SimulatedBoard {
    board: Arc<Board>,
    period: Duration,
    tick: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SimulatedBoard {
    /// Simulate readings for `board` at the default sensor period.
    pub fn new(board: Arc<Board>) -> Self {
        Self::with_period(board, DEFAULT_SENSOR_PERIOD)
    }

    /// Simulate readings for `board` every `period`.
    pub fn with_period(board: Arc<Board>, period: Duration) -> Self {
        Self {
            board,
            period: period.max(Duration::from_millis(1)),
            tick: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// The simulated board.
    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    /// Ticks published so far.
    pub fn ticks(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }

    /// Publish one tick synchronously.
    pub fn step(&self) {
        Self::publish_tick(&self.board, &self.tick);
    }

    fn publish_tick(board: &Board, tick: &AtomicU64) {
        let n = tick.fetch_add(1, Ordering::SeqCst);
        for reading in sample(n) {
            let service = reading.kind().service();
            if board.is_enabled(service) {
                board.publish(reading);
            }
        }
    }

    /// Start publishing on a tokio interval.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Simulation already running");
            return;
        }

        info!("Starting simulation for {}", self.board.identifier());

        let board = self.board.clone();
        let tick = self.tick.clone();
        let running = self.running.clone();
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            while running.load(Ordering::SeqCst) {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                Self::publish_tick(&board, &tick);
            }
            debug!("Simulation task ended");
        });

        *self.task.lock() = Some(handle);
    }

    /// Stop publishing and wait for the task to end.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Check if the simulation is publishing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sensors the simulation feeds on this board.
    pub fn sensors(&self) -> Vec<SensorKind> {
        self.board
            .enabled_services()
            .into_iter()
            .filter_map(|s| s.sensor())
            .collect()
    }
}

impl Drop for SimulatedBoard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::advertising::BoardModel;
    use crate::config::BoardConfig;
    use crate::sensor::BoardService;

    fn board() -> Arc<Board> {
        Arc::new(Board::detached(
            "sim",
            BoardModel::CircuitPlaygroundBluefruit,
            BoardConfig::default(),
        ))
    }

    #[test]
    fn test_sample_is_deterministic() {
        assert_eq!(sample(17), sample(17));
        let pressures: Vec<f32> = (0..400)
            .flat_map(sample)
            .filter_map(|r| match r {
                SensorReading::BarometricPressure(p) => Some(p),
                _ => None,
            })
            .collect();
        assert!(pressures.iter().all(|p| (1000.0..=1026.0).contains(p)));
    }

    #[test]
    fn test_buttons_only_on_change() {
        let has_buttons = |tick| {
            sample(tick)
                .iter()
                .any(|r| matches!(r, SensorReading::Buttons(_)))
        };
        assert!(has_buttons(0));
        assert!(!has_buttons(1));
        assert!(has_buttons(3));
    }

    #[test]
    fn test_step_publishes() {
        let sim = SimulatedBoard::new(board());
        assert!(sim.board().pressure().last_value().is_none());
        sim.step();
        sim.step();
        assert_eq!(sim.ticks(), 2);
        assert_eq!(sim.board().pressure().series().len(), 2);
        assert!(sim.board().accelerometer().last_value().is_some());
    }

    #[test]
    fn test_disabled_services_not_fed() {
        let board = Arc::new(Board::detached(
            "sim",
            BoardModel::Clue,
            BoardConfig::default().with_services([BoardService::Light]),
        ));
        let sim = SimulatedBoard::new(board);
        sim.step();
        assert!(sim.board().light().last_value().is_some());
        assert!(sim.board().pressure().last_value().is_none());
        assert_eq!(sim.sensors(), vec![SensorKind::Light]);
    }

    #[tokio::test]
    async fn test_start_stop() {
        let sim = SimulatedBoard::with_period(board(), Duration::from_millis(5));
        sim.start();
        assert!(sim.is_running());
        tokio::time::sleep(Duration::from_millis(40)).await;
        sim.stop().await;
        assert!(!sim.is_running());

        let ticks = sim.ticks();
        assert!(ticks > 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(sim.ticks(), ticks);
    }
}
