//! Puppet screen.
//!
//! Poses a puppet head from the accelerometer and fires animations on
//! button presses. Unlike the single-sensor screens it holds two live
//! slots: accelerometer and buttons.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

use crate::board::Board;
use crate::data::orientation::euler_from_acceleration;
use crate::data::{AccelerometerValue, ButtonsState, EulerAngles, LowPassFilter};
use crate::error::Result;
use crate::observers::CallbackHandle;
use crate::sensor::DEFAULT_SENSOR_PERIOD;

/// Filter factor for the jaw angle.
pub const JAW_FILTER_FACTOR: f32 = 0.6;
/// Filter factor for the head turn.
pub const HEAD_FILTER_FACTOR: f32 = 0.7;

const JAW_RANGE: (f32, f32) = (0.13, 0.8);
const HEAD_TILT_RANGE: (f32, f32) = (0.1, 0.7);

/// Animation triggered by a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PuppetAnimation {
    /// Button A: blink the eyes.
    Eyes,
    /// Button B: shake the head.
    Shake,
}

/// Puppet render output.
#[derive(Debug, Clone, PartialEq)]
pub struct PuppetState {
    /// Jaw rotation in radians around x.
    pub jaw: EulerAngles,
    /// Head rotation in radians.
    pub head: EulerAngles,
    /// Last acceleration, for the values panel.
    pub acceleration: Option<AccelerometerValue>,
    /// Unfiltered tilt of the last acceleration.
    pub euler: EulerAngles,
    /// Pose transition duration.
    pub animation: Duration,
    /// Animations started since the last [`PuppetView::take_animations`].
    pub pending: Vec<PuppetAnimation>,
}

/// Puppet view model.
#[derive(Debug, Clone)]
pub struct PuppetView {
    angle_x: LowPassFilter,
    angle_y: LowPassFilter,
    acceleration: Option<AccelerometerValue>,
    buttons: Option<ButtonsState>,
    pending: Vec<PuppetAnimation>,
}

impl Default for PuppetView {
    fn default() -> Self {
        Self {
            angle_x: LowPassFilter::new(0.0, JAW_FILTER_FACTOR),
            angle_y: LowPassFilter::new(0.0, HEAD_FILTER_FACTOR),
            acceleration: None,
            buttons: None,
            pending: Vec::new(),
        }
    }
}

impl PuppetView {
    /// Feed an accelerometer reading.
    pub fn apply_acceleration(&mut self, a: &AccelerometerValue) {
        let tilt = euler_from_acceleration(a);
        self.angle_x.update(tilt.x);
        self.angle_y.update(tilt.y);
        self.acceleration = Some(*a);
    }

    /// Feed a buttons state. Presses start animations on the rising edge.
    pub fn apply_buttons(&mut self, state: &ButtonsState) {
        let previous = self.buttons;
        let rising = |now: bool, before: Option<bool>| now && before != Some(true);

        if rising(
            state.button_a.is_pressed(),
            previous.map(|p| p.button_a.is_pressed()),
        ) {
            self.pending.push(PuppetAnimation::Eyes);
        }
        if rising(
            state.button_b.is_pressed(),
            previous.map(|p| p.button_b.is_pressed()),
        ) {
            self.pending.push(PuppetAnimation::Shake);
        }
        self.buttons = Some(*state);
    }

    /// Remove and return the pending animations.
    pub fn take_animations(&mut self) -> Vec<PuppetAnimation> {
        std::mem::take(&mut self.pending)
    }

    /// Current pose.
    pub fn state(&self) -> PuppetState {
        let x = self.angle_x.value();
        let y = self.angle_y.value();
        PuppetState {
            jaw: EulerAngles {
                x: x.clamp(JAW_RANGE.0, JAW_RANGE.1),
                y: 0.0,
                z: 0.0,
            },
            head: EulerAngles {
                x: -x.clamp(HEAD_TILT_RANGE.0, HEAD_TILT_RANGE.1),
                y,
                z: -y,
            },
            acceleration: self.acceleration,
            euler: self
                .acceleration
                .as_ref()
                .map(euler_from_acceleration)
                .unwrap_or_default(),
            animation: DEFAULT_SENSOR_PERIOD,
            pending: self.pending.clone(),
        }
    }
}

/// Puppet screen with `start()`/`stop()` lifecycle.
pub struct PuppetScreen {
    board: Option<Arc<Board>>,
    view: Arc<Mutex<PuppetView>>,
    handles: Mutex<Vec<CallbackHandle>>,
}

impl PuppetScreen {
    /// Create a puppet screen for `board`.
    pub fn new(board: Option<Arc<Board>>) -> Self {
        Self {
            board,
            view: Arc::new(Mutex::new(PuppetView::default())),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Apply the last readings and claim accelerometer and buttons updates.
    ///
    /// If either slot is held elsewhere nothing is claimed.
    pub fn start(&self) -> Result<()> {
        let mut handles = self.handles.lock();
        if !handles.is_empty() {
            return Ok(());
        }
        let Some(board) = &self.board else {
            return Ok(());
        };

        {
            let mut view = self.view.lock();
            if let Some(a) = board.accelerometer().last_value() {
                view.apply_acceleration(&a);
            }
            if let Some(b) = board.buttons().last_value() {
                view.buttons = Some(b);
            }
        }

        let weak: Weak<Mutex<PuppetView>> = Arc::downgrade(&self.view);
        let accelerometer = board.accelerometer().claim_live(move |a| {
            if let Some(view) = weak.upgrade() {
                view.lock().apply_acceleration(a);
            }
        })?;

        let weak = Arc::downgrade(&self.view);
        let buttons = board.buttons().claim_live(move |b| {
            if let Some(view) = weak.upgrade() {
                view.lock().apply_buttons(b);
            }
        })?;

        handles.push(accelerometer);
        handles.push(buttons);
        debug!("Started puppet screen");
        Ok(())
    }

    /// Release both live slots.
    pub fn stop(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        drop(handles);
    }

    /// Check if the screen holds live updates.
    pub fn is_started(&self) -> bool {
        !self.handles.lock().is_empty()
    }

    /// Current pose.
    pub fn render_state(&self) -> PuppetState {
        self.view.lock().state()
    }

    /// Remove and return the pending animations.
    pub fn take_animations(&self) -> Vec<PuppetAnimation> {
        self.view.lock().take_animations()
    }
}

impl Drop for PuppetScreen {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::advertising::BoardModel;
    use crate::config::BoardConfig;
    use crate::data::{ButtonState, SlideSwitch};
    use crate::error::Error;

    fn buttons(a: bool, b: bool) -> ButtonsState {
        let state = |p| if p { ButtonState::Pressed } else { ButtonState::Released };
        ButtonsState {
            slide_switch: SlideSwitch::Right,
            button_a: state(a),
            button_b: state(b),
        }
    }

    #[test]
    fn test_jaw_clamped() {
        let mut view = PuppetView::default();
        // Flat board: angle 0, clamped to the jaw minimum
        view.apply_acceleration(&AccelerometerValue::new(0.0, 0.0, 9.8));
        let state = view.state();
        assert_eq!(state.jaw.x, 0.13);
        assert_eq!(state.head.x, -0.1);

        // Tilted far: converges to the upper clamp
        for _ in 0..100 {
            view.apply_acceleration(&AccelerometerValue::new(0.0, 9.8, 0.0));
        }
        let state = view.state();
        assert_eq!(state.jaw.x, 0.8);
        assert_eq!(state.head.x, -0.7);
    }

    #[test]
    fn test_head_turns_towards_tilt() {
        let mut view = PuppetView::default();
        for _ in 0..100 {
            view.apply_acceleration(&AccelerometerValue::new(-9.8, 0.0, 9.8));
        }
        let state = view.state();
        let expected = 9.8f32.atan2(9.8);
        assert!((state.head.y - expected).abs() < 1e-3);
        assert!((state.head.z + expected).abs() < 1e-3);
    }

    #[test]
    fn test_values_panel_uses_raw_reading() {
        let mut view = PuppetView::default();
        assert_eq!(view.state().acceleration, None);
        assert_eq!(view.state().euler, EulerAngles::default());

        let tilted = AccelerometerValue::new(-9.8, 0.0, 9.8);
        view.apply_acceleration(&tilted);
        let state = view.state();
        assert_eq!(state.acceleration, Some(tilted));
        // The panel shows the unfiltered angle, the head only moved part way
        assert!((state.euler.y - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
        assert!(state.head.y < state.euler.y);
    }

    #[test]
    fn test_button_rising_edges() {
        let mut view = PuppetView::default();
        view.apply_buttons(&buttons(true, false));
        view.apply_buttons(&buttons(true, false));
        view.apply_buttons(&buttons(false, true));
        view.apply_buttons(&buttons(true, true));

        assert_eq!(
            view.take_animations(),
            vec![
                PuppetAnimation::Eyes,
                PuppetAnimation::Shake,
                PuppetAnimation::Eyes
            ]
        );
        assert!(view.take_animations().is_empty());
    }

    #[test]
    fn test_screen_lifecycle() {
        let board = Arc::new(Board::detached(
            "puppet",
            BoardModel::CircuitPlaygroundBluefruit,
            BoardConfig::default(),
        ));
        let screen = PuppetScreen::new(Some(board.clone()));
        assert!(screen.start().is_ok());
        assert!(screen.is_started());
        assert!(matches!(
            board.buttons().claim_live(|_| {}),
            Err(Error::LiveSlotOccupied { .. })
        ));

        board.publish_buttons(buttons(false, true));
        assert_eq!(screen.take_animations(), vec![PuppetAnimation::Shake]);

        screen.stop();
        assert!(!board.accelerometer().has_live_owner());
        board.publish_buttons(buttons(true, false));
        assert!(screen.take_animations().is_empty());
    }
}
