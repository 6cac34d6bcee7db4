//! Module screens.
//!
//! A [`ModuleScreen`] binds one [`SensorView`] to a board session. While
//! started it holds the sensor's live slot and renders every reading into
//! the view and its chart panel.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::board::Board;
use crate::board_manager::BoardManager;
use crate::channel::SensorChannel;
use crate::data::SensorDataSeries;
use crate::error::Result;
use crate::observers::CallbackHandle;

use super::chart::{ChartPanel, ChartPoint, ValueTransform};

/// View model of a single-sensor screen.
pub trait SensorView: Send + 'static {
    /// Reading type of the sensor.
    type Value: Clone + Send + Sync + 'static;
    /// Type recorded in the sensor's series.
    type Series: Clone + Send + Sync + 'static;
    /// Render output.
    type State: Clone + PartialEq + std::fmt::Debug;

    /// The channel this view reads.
    fn channel(board: &Board) -> &SensorChannel<Self::Value, Self::Series>;

    /// Series shown in the chart panel, if the screen has one.
    fn chart_series(&self, _board: &Board) -> Option<Arc<SensorDataSeries<f32>>> {
        None
    }

    /// Transform applied to charted values.
    fn chart_transform(&self) -> ValueTransform {
        |v| v
    }

    /// Apply a reading, or `None` if there is none yet.
    fn render(&mut self, value: Option<&Self::Value>);

    /// Current render output.
    fn state(&self) -> Self::State;
}

struct ScreenInner<V> {
    view: V,
    chart: Option<ChartPanel>,
}

impl<V: SensorView> ScreenInner<V> {
    fn apply(&mut self, value: &V::Value) {
        self.view.render(Some(value));
        if let Some(chart) = self.chart.as_mut() {
            chart.append_latest();
        }
    }

    fn reload_chart(&mut self) {
        let transform = self.view.chart_transform();
        if let Some(chart) = self.chart.as_mut() {
            chart.set_transform(transform);
            chart.reload();
        }
    }
}

/// A sensor screen with an explicit `start()`/`stop()` lifecycle.
///
/// Without a board the screen renders placeholders and `start()` succeeds
/// without claiming anything.
pub struct ModuleScreen<V: SensorView> {
    board: Option<Arc<Board>>,
    inner: Arc<Mutex<ScreenInner<V>>>,
    handle: Mutex<Option<CallbackHandle>>,
}

impl<V: SensorView> ModuleScreen<V> {
    /// Create a screen for `board`.
    pub fn new(board: Option<Arc<Board>>, view: V) -> Self {
        let mut inner = ScreenInner { view, chart: None };
        inner.view.render(None);
        Self {
            board,
            inner: Arc::new(Mutex::new(inner)),
            handle: Mutex::new(None),
        }
    }

    /// Create a screen for the manager's current board.
    pub fn for_current_board(manager: &BoardManager, view: V) -> Self {
        Self::new(manager.current_board(), view)
    }

    /// The board this screen reads.
    pub fn board(&self) -> Option<&Arc<Board>> {
        self.board.as_ref()
    }

    /// Render the last value, reload the chart and claim live updates.
    ///
    /// Starting a started screen does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LiveSlotOccupied`](crate::Error::LiveSlotOccupied)
    /// if another screen holds the sensor's live slot.
    pub fn start(&self) -> Result<()> {
        self.start_with(|channel, callback| channel.claim_live(callback))
    }

    /// Like [`start`](Self::start), revoking the current live owner.
    pub fn start_taking_over(&self) -> Result<()> {
        self.start_with(|channel, callback| Ok(channel.take_over_live(callback)))
    }

    fn start_with<C>(&self, claim: C) -> Result<()>
    where
        C: FnOnce(
            &SensorChannel<V::Value, V::Series>,
            Box<dyn Fn(&V::Value) + Send + Sync>,
        ) -> Result<CallbackHandle>,
    {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            debug!("Screen already started");
            return Ok(());
        }

        let Some(board) = &self.board else {
            self.inner.lock().view.render(None);
            return Ok(());
        };
        let channel = V::channel(board);

        {
            let mut inner = self.inner.lock();
            let last = channel.last_value();
            inner.view.render(last.as_ref());
            inner.chart = inner.view.chart_series(board).map(ChartPanel::new);
            inner.reload_chart();
        }

        let weak: Weak<Mutex<ScreenInner<V>>> = Arc::downgrade(&self.inner);
        let callback: Box<dyn Fn(&V::Value) + Send + Sync> =
            Box::new(move |value: &V::Value| {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().apply(value);
                }
            });

        *handle = Some(claim(channel, callback)?);
        debug!("Started {} screen", channel.kind());
        Ok(())
    }

    /// Release live updates.
    ///
    /// Once this returns no further reading reaches the screen.
    pub fn stop(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            debug!("Stopping screen (callback {})", handle.id());
            drop(handle);
        }
    }

    /// Check if the screen holds live updates.
    pub fn is_started(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Snapshot of the view's render output.
    pub fn render_state(&self) -> V::State {
        self.inner.lock().view.state()
    }

    /// Points of the chart panel.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        self.inner
            .lock()
            .chart
            .as_ref()
            .map(ChartPanel::points)
            .unwrap_or_default()
    }

    /// Run `f` with the view and chart panel.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut V, Option<&mut ChartPanel>) -> R) -> R {
        let mut inner = self.inner.lock();
        let ScreenInner { view, chart } = &mut *inner;
        f(view, chart.as_mut())
    }

    pub(crate) fn update_view(&self, f: impl FnOnce(&mut V)) {
        let mut inner = self.inner.lock();
        f(&mut inner.view);
        inner.reload_chart();
    }
}

impl<V: SensorView> Drop for ModuleScreen<V> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<V: SensorView> std::fmt::Debug for ModuleScreen<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleScreen")
            .field("board", &self.board.as_ref().map(|b| b.identifier().to_string()))
            .field("started", &self.is_started())
            .finish()
    }
}
