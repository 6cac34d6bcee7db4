//! Terminal sensor dashboard
//!
//! Shows the pressure, sound, light, temperature and humidity screens side
//! by side, plus the puppet pose and buttons. Feeds a simulated board unless
//! `--connect` is given.
//!
//! Run with: cargo run --example sensor_dashboard
//!
//! With hardware:
//!   cargo run --example sensor_dashboard -- --connect
//!
//! Keys: `u` toggles the temperature unit, `q` quits.

use bluefruit_playground_ble::presentation::{ChartPoint, PuppetScreen, QuaternionScreen};
use bluefruit_playground_ble::{
    Board, BoardConfig, BoardManager, BoardModel, ButtonsScreen, ButtonsView, Error,
    HumidityScreen, HumidityView, LightScreen, LightView, PressureScreen, PressureView,
    QuaternionView, Result, SimulatedBoard, SoundScreen, SoundView, TemperatureScreen, TemperatureView,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use std::io::{self, stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

/// Main terminal type alias
type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

struct App {
    manager: BoardManager,
    simulation: Option<SimulatedBoard>,
    pressure: PressureScreen,
    sound: SoundScreen,
    light: LightScreen,
    temperature: TemperatureScreen,
    humidity: HumidityScreen,
    buttons: ButtonsScreen,
    puppet: PuppetScreen,
    orientation: QuaternionScreen,
}

impl App {
    async fn new(connect: bool) -> Result<Self> {
        let (manager, simulation) = if connect {
            let manager = BoardManager::new().await?;
            manager.start_scanning().await?;
            tokio::time::sleep(Duration::from_secs(5)).await;
            manager.stop_scanning().await?;
            let board = manager.nearest_board().ok_or_else(|| Error::BoardNotFound {
                identifier: "any".to_string(),
            })?;
            manager.start_board(board).await?;
            (manager, None)
        } else {
            let board = Arc::new(Board::detached(
                "simulated",
                BoardModel::CircuitPlaygroundBluefruit,
                BoardConfig::default(),
            ));
            let simulation = SimulatedBoard::new(board.clone());
            simulation.start();
            (BoardManager::with_current(board), Some(simulation))
        };

        let board = manager.current_board();
        let app = Self {
            pressure: PressureScreen::new(board.clone(), PressureView::default()),
            sound: SoundScreen::new(board.clone(), SoundView::default()),
            light: LightScreen::new(board.clone(), LightView::default()),
            temperature: TemperatureScreen::new(board.clone(), TemperatureView::default()),
            humidity: HumidityScreen::new(board.clone(), HumidityView::default()),
            buttons: ButtonsScreen::new(board.clone(), ButtonsView::default()),
            orientation: QuaternionScreen::new(board.clone(), QuaternionView::default()),
            puppet: PuppetScreen::new(board),
            manager,
            simulation,
        };

        app.pressure.start()?;
        app.sound.start()?;
        app.light.start()?;
        app.temperature.start()?;
        app.humidity.start()?;
        app.buttons.start()?;
        app.puppet.start()?;
        app.orientation.start()?;

        Ok(app)
    }

    async fn shutdown(self) -> Result<()> {
        self.pressure.stop();
        self.sound.stop();
        self.light.stop();
        self.temperature.stop();
        self.humidity.stop();
        self.buttons.stop();
        self.puppet.stop();
        self.orientation.stop();
        if let Some(simulation) = &self.simulation {
            simulation.stop().await;
        }
        self.manager.shutdown().await
    }
}

fn setup_terminal() -> io::Result<Terminal> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn chart_widget<'a>(title: &'a str, points: &'a [(f64, f64)]) -> Chart<'a> {
    let (x_min, x_max) = points
        .last()
        .map(|(x, _)| ((x - 20.0).max(0.0), x.max(20.0)))
        .unwrap_or((0.0, 20.0));
    let (y_min, y_max) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), (_, y)| {
        (lo.min(*y), hi.max(*y))
    });
    let (y_min, y_max) = if y_min <= y_max {
        (y_min - 1.0, y_max + 1.0)
    } else {
        (0.0, 1.0)
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(points);

    Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(Axis::default().bounds([x_min, x_max]))
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        )
}

fn to_pairs(points: Vec<ChartPoint>) -> Vec<(f64, f64)> {
    points.into_iter().map(|p| (p.x, p.y)).collect()
}

fn render_ui(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
        ])
        .split(frame.area());

    let pressure = app.pressure.render_state();
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Pressure (hPa)"))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(f64::from(pressure.needle.progress))
            .label(format!("{}  needle {:.0}°", pressure.label, pressure.needle.degrees)),
        rows[0],
    );

    let gauges = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let sound = app.sound.render_state();
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Sound (dBFS)"))
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(f64::from(sound.meter.proportion))
            .label(format!("{} ({}/{})", sound.label, sound.meter.lit, sound.meter.levels)),
        gauges[0],
    );

    let light = app.light.render_state();
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Light (lux)"))
            .gauge_style(Style::default().fg(Color::Yellow))
            .ratio(f64::from(light.fill))
            .label(light.label),
        gauges[1],
    );

    let climate = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);

    let temperature = app.temperature.render_state();
    frame.render_widget(
        Paragraph::new(temperature.label)
            .block(Block::default().borders(Borders::ALL).title("Temperature [u]")),
        climate[0],
    );

    let humidity = app.humidity.render_state();
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Humidity"))
            .gauge_style(Style::default().fg(Color::Blue))
            .ratio(f64::from(humidity.fill))
            .label(humidity.label),
        climate[1],
    );

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);

    let pressure_points = to_pairs(app.pressure.chart_points());
    frame.render_widget(chart_widget("Pressure", &pressure_points), charts[0]);
    let temperature_points = to_pairs(app.temperature.chart_points());
    frame.render_widget(chart_widget("Temperature", &temperature_points), charts[1]);

    let buttons = app.buttons.render_state();
    let puppet = app.puppet.render_state();
    let buttons_text = match buttons.buttons {
        Some(b) => format!(
            "Switch: {:?}  A: {:?}  B: {:?}",
            b.slide_switch, b.button_a, b.button_b
        ),
        None => "Switch: --  A: --  B: --".to_string(),
    };
    let puppet_text = format!(
        "Puppet jaw {:.2} rad  head ({:.2}, {:.2}, {:.2})  pending {:?}",
        puppet.jaw.x, puppet.head.x, puppet.head.y, puppet.head.z, puppet.pending
    );
    let orientation = app.orientation.render_state();
    let [pitch, yaw, roll] = &orientation.euler_degrees;
    let orientation_text = format!("Orientation pitch {}°  yaw {}°  roll {}°", pitch, yaw, roll);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(buttons_text),
            Line::from(puppet_text),
            Line::from(orientation_text),
        ])
        .block(Block::default().borders(Borders::ALL).title("Buttons / Puppet / Orientation")),
        rows[4],
    );
}

async fn run_app(terminal: &mut Terminal, app: &App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| render_ui(frame, app))
            .map_err(|e| Error::Internal(format!("Draw error: {}", e)))?;

        let has_event = event::poll(Duration::from_millis(100))
            .map_err(|e| Error::Internal(format!("Poll error: {}", e)))?;

        if has_event {
            let event = event::read().map_err(|e| Error::Internal(format!("Read error: {}", e)))?;
            if let Event::Key(key) = event {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('u') => {
                            app.temperature.toggle_unit();
                        }
                        _ => {}
                    }
                }
            }
        }

        // Animations are one-shot
        let _ = app.puppet.take_animations();
        tokio::task::yield_now().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to file (so it doesn't interfere with TUI)
    if let Ok(log_file) = std::fs::File::create("sensor_dashboard.log") {
        tracing_subscriber::fmt()
            .with_env_filter("warn,bluefruit_playground_ble=debug")
            .with_writer(std::sync::Mutex::new(log_file))
            .with_ansi(false)
            .init();
    }

    let connect = std::env::args().any(|arg| arg == "--connect");

    let app = App::new(connect).await?;

    let mut terminal = setup_terminal()
        .map_err(|e| Error::Internal(format!("Failed to setup terminal: {}", e)))?;

    let result = run_app(&mut terminal, &app).await;

    let _ = restore_terminal(&mut terminal);
    app.shutdown().await?;

    result
}
