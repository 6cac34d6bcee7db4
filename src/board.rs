//! Board session.
//!
//! A [`Board`] is one Adafruit board together with its cached state: the
//! last reading and recorded series of every sensor, the live-update
//! registrations, and the services enabled on connect.

use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::f32::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::advertising::BoardModel;
use crate::ble::characteristics::CharacteristicHandler;
use crate::ble::connection::{ConnectionManager, ConnectionState};
use crate::ble::uuids::*;
use crate::channel::SensorChannel;
use crate::config::BoardConfig;
use crate::data::orientation::quaternion_rotated;
use crate::data::{
    AccelerometerValue, ButtonsState, ColorValue, GyroscopeValue, MagnetometerValue,
    QuaternionValue, RgbColor, SensorDataSeries, SoundAmplitudes,
};
use crate::error::{Error, Result};
use crate::protocol::{decode_reading, encode_pixels, encode_tone, pixels_from_mask};
use crate::protocol::readings::parse_buttons;
use crate::sensor::{BoardService, SensorKind, SensorReading};

/// Device information read from the standard service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// Manufacturer name.
    pub manufacturer: Option<String>,
    /// Model number.
    pub model_number: Option<String>,
    /// Firmware revision.
    pub firmware_revision: Option<String>,
}

struct BoardState {
    enabled: HashSet<BoardService>,
    sound_channels: usize,
    last_update: Instant,
    rssi: Option<i16>,
    device_info: DeviceInfo,
}

/// Shared core touched by the notification task.
struct BoardCore {
    identifier: String,
    model: BoardModel,
    config: BoardConfig,
    state: RwLock<BoardState>,
    light: SensorChannel<f32>,
    buttons: SensorChannel<ButtonsState>,
    accelerometer: SensorChannel<AccelerometerValue>,
    temperature: SensorChannel<f32>,
    humidity: SensorChannel<f32>,
    pressure: SensorChannel<f32>,
    sound: SensorChannel<SoundAmplitudes, f32>,
    gyroscope: SensorChannel<GyroscopeValue>,
    quaternion: SensorChannel<QuaternionValue>,
    magnetometer: SensorChannel<MagnetometerValue>,
    color: SensorChannel<ColorValue>,
    readings_tx: broadcast::Sender<SensorReading>,
}

fn first_finite_amplitude(amplitudes: &SoundAmplitudes) -> Option<f32> {
    amplitudes
        .first()
        .filter(|a| a.is_finite())
        .map(|a| a as f32)
}

impl BoardCore {
    fn new(identifier: String, model: BoardModel, config: BoardConfig) -> Self {
        let capacity = config.series_capacity;
        let rec = |kind| config.records(kind);
        let (readings_tx, _) = broadcast::channel(256);

        Self {
            light: SensorChannel::new(SensorKind::Light, capacity, rec(SensorKind::Light)),
            buttons: SensorChannel::new(SensorKind::Buttons, capacity, rec(SensorKind::Buttons)),
            accelerometer: SensorChannel::new(
                SensorKind::Accelerometer,
                capacity,
                rec(SensorKind::Accelerometer),
            ),
            temperature: SensorChannel::new(
                SensorKind::Temperature,
                capacity,
                rec(SensorKind::Temperature),
            ),
            humidity: SensorChannel::new(SensorKind::Humidity, capacity, rec(SensorKind::Humidity)),
            pressure: SensorChannel::new(
                SensorKind::BarometricPressure,
                capacity,
                rec(SensorKind::BarometricPressure),
            ),
            sound: SensorChannel::with_mapper(
                SensorKind::Sound,
                capacity,
                rec(SensorKind::Sound),
                first_finite_amplitude,
            ),
            gyroscope: SensorChannel::new(SensorKind::Gyroscope, capacity, rec(SensorKind::Gyroscope)),
            quaternion: SensorChannel::new(
                SensorKind::Quaternion,
                capacity,
                rec(SensorKind::Quaternion),
            ),
            magnetometer: SensorChannel::new(
                SensorKind::Magnetometer,
                capacity,
                rec(SensorKind::Magnetometer),
            ),
            color: SensorChannel::new(SensorKind::Color, capacity, rec(SensorKind::Color)),
            state: RwLock::new(BoardState {
                enabled: HashSet::new(),
                sound_channels: 1,
                last_update: Instant::now(),
                rssi: None,
                device_info: DeviceInfo::default(),
            }),
            readings_tx,
            identifier,
            model,
            config,
        }
    }

    fn adjust_orientation(&self, reading: SensorReading) -> SensorReading {
        if !self.model.needs_orientation_adjustment() {
            return reading;
        }
        match reading {
            SensorReading::Accelerometer(v) if self.config.auto_adjust_accelerometer => {
                SensorReading::Accelerometer(AccelerometerValue {
                    x: -v.x,
                    y: v.y,
                    z: -v.z,
                })
            }
            SensorReading::Quaternion(q) if self.config.auto_adjust_quaternion => {
                SensorReading::Quaternion(quaternion_rotated(&q, PI, (0.0, 1.0, 0.0)))
            }
            other => other,
        }
    }

    fn publish(&self, reading: SensorReading) {
        let reading = self.adjust_orientation(reading);
        self.state.write().last_update = Instant::now();

        match reading.clone() {
            SensorReading::Light(v) => self.light.publish(v),
            SensorReading::Buttons(v) => self.buttons.publish(v),
            SensorReading::Accelerometer(v) => self.accelerometer.publish(v),
            SensorReading::Temperature(v) => self.temperature.publish(v),
            SensorReading::Humidity(v) => self.humidity.publish(v),
            SensorReading::BarometricPressure(v) => self.pressure.publish(v),
            SensorReading::Sound(v) => self.sound.publish(v),
            SensorReading::Gyroscope(v) => self.gyroscope.publish(v),
            SensorReading::Quaternion(v) => self.quaternion.publish(v),
            SensorReading::Magnetometer(v) => self.magnetometer.publish(v),
            SensorReading::Color(v) => self.color.publish(v),
        }

        let _ = self.readings_tx.send(reading);
    }

    fn apply_notification(&self, uuid: &Uuid, data: &[u8]) -> Result<()> {
        let kind = BoardService::from_characteristic(uuid)
            .and_then(|s| s.sensor())
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })?;
        let channels = self.state.read().sound_channels;
        let reading = decode_reading(kind, data, channels)?;
        trace!("{} reading: {:?}", kind, reading);
        self.publish(reading);
        Ok(())
    }

    fn reset_series(&self) {
        self.light.series().clear();
        self.buttons.series().clear();
        self.accelerometer.series().clear();
        self.temperature.series().clear();
        self.humidity.series().clear();
        self.pressure.series().clear();
        self.sound.series().clear();
        self.gyroscope.series().clear();
        self.quaternion.series().clear();
        self.magnetometer.series().clear();
        self.color.series().clear();
    }
}

/// An Adafruit board session.
pub struct Board {
    core: Arc<BoardCore>,
    connection: Option<Arc<ConnectionManager>>,
    characteristics: Arc<RwLock<Option<Arc<CharacteristicHandler>>>>,
    notification_task: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl Board {
    /// Create a board backed by a BLE peripheral.
    pub(crate) fn new(
        identifier: String,
        peripheral: Peripheral,
        model: BoardModel,
        config: BoardConfig,
    ) -> Self {
        let connection = ConnectionManager::with_retry(
            peripheral,
            config.reconnect_attempts,
            config.reconnect_delay,
        );
        Self {
            core: Arc::new(BoardCore::new(identifier, model, config)),
            connection: Some(Arc::new(connection)),
            characteristics: Arc::new(RwLock::new(None)),
            notification_task: RwLock::new(None),
        }
    }

    /// Create a board with no BLE link.
    ///
    /// Readings are supplied with [`publish`](Self::publish) or
    /// [`apply_notification`](Self::apply_notification); commands fail with
    /// [`Error::NotConnected`].
    pub fn detached(identifier: impl Into<String>, model: BoardModel, config: BoardConfig) -> Self {
        Self {
            core: Arc::new(BoardCore::new(identifier.into(), model, config)),
            connection: None,
            characteristics: Arc::new(RwLock::new(None)),
            notification_task: RwLock::new(None),
        }
    }

    /// BLE identifier.
    pub fn identifier(&self) -> &str {
        &self.core.identifier
    }

    /// Board model.
    pub fn model(&self) -> BoardModel {
        self.core.model
    }

    /// Session configuration.
    pub fn config(&self) -> &BoardConfig {
        &self.core.config
    }

    /// Check if the board has a BLE link object (it may be disconnected).
    pub fn is_detached(&self) -> bool {
        self.connection.is_none()
    }

    /// Current connection state. Detached boards report `Connected`.
    pub fn connection_state(&self) -> ConnectionState {
        match &self.connection {
            Some(connection) => connection.state(),
            None => ConnectionState::Connected,
        }
    }

    /// Subscribe to connection state changes.
    pub fn subscribe_connection(&self) -> Option<broadcast::Receiver<crate::ble::ConnectionEvent>> {
        self.connection.as_ref().map(|c| c.subscribe())
    }

    /// Signal strength from the last advertisement.
    pub fn rssi(&self) -> Option<i16> {
        self.core.state.read().rssi
    }

    pub(crate) fn update_rssi(&self, rssi: Option<i16>) {
        if rssi.is_some() {
            self.core.state.write().rssi = rssi;
        }
    }

    /// Device information read on connect.
    pub fn device_info(&self) -> DeviceInfo {
        self.core.state.read().device_info.clone()
    }

    /// Connect and enable the configured services.
    ///
    /// A service that fails to enable is logged and left unavailable.
    ///
    /// # Errors
    ///
    /// Fails if the link cannot be established or characteristics cannot
    /// be discovered. Detached boards return [`Error::NotSupported`].
    pub async fn connect(&self) -> Result<()> {
        let connection = self.connection.as_ref().ok_or_else(|| Error::NotSupported {
            operation: "connect on a detached board".to_string(),
        })?;

        info!("Connecting to {} {}", self.model(), self.identifier());

        connection.connect(self.config().maintain_connection).await?;

        let handler = Arc::new(CharacteristicHandler::new(connection.peripheral().clone()));
        handler.discover_characteristics().await?;

        self.reset_series();

        let mut enabled = HashSet::new();
        for &service in &self.config().services {
            if service == BoardService::NeoPixels && self.model().neopixel_count() == 0 {
                debug!("{} has no NeoPixels", self.model());
                continue;
            }
            match handler
                .enable_service(service, self.config().period_for(service))
                .await
            {
                Ok(()) => {
                    enabled.insert(service);
                }
                Err(e) => warn!("{} service not available: {}", service, e),
            }
        }

        if enabled.contains(&BoardService::Sound) {
            match handler.read_sound_channels().await {
                Ok(channels) => self.core.state.write().sound_channels = channels,
                Err(e) => debug!("Using one sound channel: {}", e),
            }
        }

        let device_info = DeviceInfo {
            manufacturer: handler.read_manufacturer_name().await.ok(),
            model_number: handler.read_model_number().await.ok(),
            firmware_revision: handler.read_firmware_revision().await.ok(),
        };

        handler.start_notifications().await?;
        self.start_notification_handler(&handler, connection.clone());

        {
            let mut state = self.core.state.write();
            state.enabled = enabled;
            state.device_info = device_info;
            state.last_update = Instant::now();
        }
        *self.characteristics.write() = Some(handler);

        info!(
            "Connected to {} with {} services",
            self.identifier(),
            self.enabled_services().len()
        );
        Ok(())
    }

    fn start_notification_handler(
        &self,
        handler: &CharacteristicHandler,
        connection: Arc<ConnectionManager>,
    ) {
        let mut rx = handler.subscribe_notifications();
        let stream_closed = handler.stream_closed();
        let core = self.core.clone();

        let task = tokio::spawn(async move {
            debug!("Notification handler started");
            loop {
                tokio::select! {
                    result = rx.recv() => match result {
                        Ok(event) => {
                            if let Err(e) = core.apply_notification(&event.characteristic_uuid, &event.data) {
                                debug!("Ignoring notification from {}: {}", event.characteristic_uuid, e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Notification handler lagged, {} notifications dropped", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stream_closed.notified() => {
                        core.state.write().enabled.clear();
                        connection.mark_disconnected();
                        break;
                    }
                }
            }
            debug!("Notification handler stopped");
        });

        if let Some(previous) = self.notification_task.write().replace(task) {
            previous.abort();
        }
    }

    /// Stop notification handling and forget the enabled services.
    ///
    /// With `stop_sensors` set, each enabled sensor's period is disabled
    /// first so the board stops sampling.
    async fn release_session(&self, stop_sensors: bool) {
        let handler = self.characteristics.write().take();
        if let Some(handler) = handler {
            if stop_sensors {
                for service in self.enabled_services() {
                    if let Err(e) = handler.disable_service(service).await {
                        debug!("Failed to disable {}: {}", service, e);
                    }
                }
            }
            handler.stop_notifications().await;
        }
        let task = self.notification_task.write().take();
        if let Some(task) = task {
            task.abort();
        }
        self.core.state.write().enabled.clear();
    }

    /// Turn the NeoPixels off, stop the sensors and disconnect.
    pub async fn disconnect(&self) -> Result<()> {
        let Some(connection) = &self.connection else {
            return Ok(());
        };

        info!("Disconnecting from {}", self.identifier());

        if self.is_enabled(BoardService::NeoPixels) {
            if let Err(e) = self.set_all_pixels(RgbColor::OFF).await {
                debug!("Failed to turn NeoPixels off: {}", e);
            }
        }

        self.release_session(true).await;
        connection.disconnect().await
    }

    /// Record that the link dropped without a [`disconnect`](Self::disconnect).
    ///
    /// Returns false for detached boards and links that were already down.
    pub fn mark_link_lost(&self) -> bool {
        let Some(connection) = &self.connection else {
            return false;
        };
        self.core.state.write().enabled.clear();
        connection.mark_disconnected()
    }

    /// Check if the board should be reconnected after a link loss.
    pub fn is_maintaining_connection(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| c.is_maintaining_connection())
    }

    /// Drop the old session and run [`connect`](Self::connect) again.
    ///
    /// Recorded series are reset as on any connect.
    pub async fn reconnect(&self) -> Result<()> {
        info!("Reconnecting to {}", self.identifier());
        self.release_session(false).await;
        self.connect().await
    }

    /// Check if a service was enabled on connect.
    ///
    /// On a detached board every configured service counts as enabled.
    pub fn is_enabled(&self, service: BoardService) -> bool {
        if self.is_detached() {
            return self.config().enables(service);
        }
        self.core.state.read().enabled.contains(&service)
    }

    /// Services enabled on connect, in configuration order.
    pub fn enabled_services(&self) -> Vec<BoardService> {
        self.config()
            .services
            .iter()
            .copied()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }

    /// Decode a characteristic notification and publish the reading.
    pub fn apply_notification(&self, uuid: &Uuid, data: &[u8]) -> Result<()> {
        self.core.apply_notification(uuid, data)
    }

    /// Set the number of interleaved microphone channels.
    pub fn set_sound_channels(&self, channels: usize) {
        self.core.state.write().sound_channels = channels.max(1);
    }

    /// Publish a reading as if it had arrived from the board.
    pub fn publish(&self, reading: SensorReading) {
        self.core.publish(reading);
    }

    /// Publish a light reading in lux.
    pub fn publish_light(&self, lux: f32) {
        self.publish(SensorReading::Light(lux));
    }

    /// Publish a temperature reading in °C.
    pub fn publish_temperature(&self, celsius: f32) {
        self.publish(SensorReading::Temperature(celsius));
    }

    /// Publish a humidity reading in %.
    pub fn publish_humidity(&self, percent: f32) {
        self.publish(SensorReading::Humidity(percent));
    }

    /// Publish a pressure reading in hPa.
    pub fn publish_pressure(&self, hpa: f32) {
        self.publish(SensorReading::BarometricPressure(hpa));
    }

    /// Publish per-channel sound amplitudes in dBFS.
    pub fn publish_sound(&self, amplitudes: SoundAmplitudes) {
        self.publish(SensorReading::Sound(amplitudes));
    }

    /// Publish an accelerometer reading.
    pub fn publish_accelerometer(&self, value: AccelerometerValue) {
        self.publish(SensorReading::Accelerometer(value));
    }

    /// Publish a buttons state.
    pub fn publish_buttons(&self, state: ButtonsState) {
        self.publish(SensorReading::Buttons(state));
    }

    /// Publish a gyroscope reading.
    pub fn publish_gyroscope(&self, value: GyroscopeValue) {
        self.publish(SensorReading::Gyroscope(value));
    }

    /// Publish a quaternion.
    pub fn publish_quaternion(&self, value: QuaternionValue) {
        self.publish(SensorReading::Quaternion(value));
    }

    /// Publish a magnetometer reading.
    pub fn publish_magnetometer(&self, value: MagnetometerValue) {
        self.publish(SensorReading::Magnetometer(value));
    }

    /// Publish a color sensor reading.
    pub fn publish_color(&self, value: ColorValue) {
        self.publish(SensorReading::Color(value));
    }

    // === Sensors ===

    /// Light sensor (lux).
    pub fn light(&self) -> &SensorChannel<f32> {
        &self.core.light
    }

    /// Buttons and slide switch.
    pub fn buttons(&self) -> &SensorChannel<ButtonsState> {
        &self.core.buttons
    }

    /// Accelerometer (m/s²), orientation-adjusted.
    pub fn accelerometer(&self) -> &SensorChannel<AccelerometerValue> {
        &self.core.accelerometer
    }

    /// Temperature (°C).
    pub fn temperature(&self) -> &SensorChannel<f32> {
        &self.core.temperature
    }

    /// Relative humidity (%).
    pub fn humidity(&self) -> &SensorChannel<f32> {
        &self.core.humidity
    }

    /// Barometric pressure (hPa).
    pub fn pressure(&self) -> &SensorChannel<f32> {
        &self.core.pressure
    }

    /// Sound amplitudes; the series records the first channel.
    pub fn sound(&self) -> &SensorChannel<SoundAmplitudes, f32> {
        &self.core.sound
    }

    /// Gyroscope (rad/s).
    pub fn gyroscope(&self) -> &SensorChannel<GyroscopeValue> {
        &self.core.gyroscope
    }

    /// Orientation quaternion, orientation-adjusted.
    pub fn quaternion(&self) -> &SensorChannel<QuaternionValue> {
        &self.core.quaternion
    }

    /// Magnetometer (µT).
    pub fn magnetometer(&self) -> &SensorChannel<MagnetometerValue> {
        &self.core.magnetometer
    }

    /// Color sensor.
    pub fn color(&self) -> &SensorChannel<ColorValue> {
        &self.core.color
    }

    /// Series of a scalar sensor (light, temperature, humidity, pressure,
    /// sound amplitude).
    pub fn scalar_series(&self, kind: SensorKind) -> Option<Arc<SensorDataSeries<f32>>> {
        match kind {
            SensorKind::Light => Some(self.core.light.series()),
            SensorKind::Temperature => Some(self.core.temperature.series()),
            SensorKind::Humidity => Some(self.core.humidity.series()),
            SensorKind::BarometricPressure => Some(self.core.pressure.series()),
            SensorKind::Sound => Some(self.core.sound.series()),
            _ => None,
        }
    }

    /// Last reading of any sensor.
    pub fn last_reading(&self, kind: SensorKind) -> Option<SensorReading> {
        let core = &self.core;
        match kind {
            SensorKind::Light => core.light.last_value().map(SensorReading::Light),
            SensorKind::Buttons => core.buttons.last_value().map(SensorReading::Buttons),
            SensorKind::Accelerometer => core
                .accelerometer
                .last_value()
                .map(SensorReading::Accelerometer),
            SensorKind::Temperature => core.temperature.last_value().map(SensorReading::Temperature),
            SensorKind::Humidity => core.humidity.last_value().map(SensorReading::Humidity),
            SensorKind::BarometricPressure => core
                .pressure
                .last_value()
                .map(SensorReading::BarometricPressure),
            SensorKind::Sound => core.sound.last_value().map(SensorReading::Sound),
            SensorKind::Gyroscope => core.gyroscope.last_value().map(SensorReading::Gyroscope),
            SensorKind::Quaternion => core.quaternion.last_value().map(SensorReading::Quaternion),
            SensorKind::Magnetometer => core
                .magnetometer
                .last_value()
                .map(SensorReading::Magnetometer),
            SensorKind::Color => core.color.last_value().map(SensorReading::Color),
        }
    }

    /// Receive every reading asynchronously.
    pub fn subscribe_readings(&self) -> broadcast::Receiver<SensorReading> {
        self.core.readings_tx.subscribe()
    }

    /// Clear every recorded series.
    pub fn reset_series(&self) {
        debug!("Clearing data series for {}", self.identifier());
        self.core.reset_series();
    }

    /// Check if no data has arrived within the stale timeout.
    pub fn is_stale(&self) -> bool {
        self.core.state.read().last_update.elapsed() > self.config().stale_timeout
    }

    /// Time since the last reading.
    pub fn time_since_update(&self) -> Duration {
        self.core.state.read().last_update.elapsed()
    }

    // === Commands ===

    fn handler_for(&self, service: BoardService) -> Result<Arc<CharacteristicHandler>> {
        let handler = self
            .characteristics
            .read()
            .clone()
            .ok_or(Error::NotConnected)?;
        if !self.is_enabled(service) {
            return Err(Error::NotSupported {
                operation: format!("{} service is not available", service),
            });
        }
        Ok(handler)
    }

    /// Light every NeoPixel with `color`.
    pub async fn set_all_pixels(&self, color: RgbColor) -> Result<()> {
        let count = self.model().neopixel_count();
        self.set_pixels(color, &vec![true; count]).await
    }

    /// Light the NeoPixels whose mask entry is `true`; the rest turn off.
    pub async fn set_pixels(&self, color: RgbColor, mask: &[bool]) -> Result<()> {
        let handler = self.handler_for(BoardService::NeoPixels)?;
        let count = self.model().neopixel_count();
        let color = color.scaled(self.config().neopixel_brightness);
        let pixels = pixels_from_mask(color, mask, count);
        let data = encode_pixels(0, &pixels, true)?;
        debug!("Setting {} NeoPixels", pixels.len());
        handler
            .write(&NEOPIXELS_SERVICE_UUID, &NEOPIXELS_DATA_UUID, &data, true)
            .await
    }

    /// Play a tone until [`stop_tone`](Self::stop_tone).
    pub async fn play_tone(&self, frequency: u16) -> Result<()> {
        self.play_tone_for(frequency, None).await
    }

    /// Play a tone for `duration` (`None` plays until stopped).
    pub async fn play_tone_for(&self, frequency: u16, duration: Option<Duration>) -> Result<()> {
        if frequency == 0 {
            return Err(Error::InvalidParameter {
                name: "frequency".to_string(),
                value: "0".to_string(),
            });
        }
        let handler = self.handler_for(BoardService::ToneGenerator)?;
        let data = encode_tone(frequency, duration)?;
        handler
            .write(&TONE_GENERATOR_SERVICE_UUID, &TONE_GENERATOR_UUID, &data, true)
            .await
    }

    /// Stop the tone generator.
    pub async fn stop_tone(&self) -> Result<()> {
        let handler = self.handler_for(BoardService::ToneGenerator)?;
        let data = encode_tone(0, None)?;
        handler
            .write(&TONE_GENERATOR_SERVICE_UUID, &TONE_GENERATOR_UUID, &data, true)
            .await
    }

    /// Read the buttons state and publish it.
    pub async fn read_buttons(&self) -> Result<ButtonsState> {
        let handler = self.handler_for(BoardService::Buttons)?;
        let data = handler.read(&BUTTONS_SERVICE_UUID, &BUTTONS_UUID).await?;
        let state = parse_buttons(&data)?;
        self.publish_buttons(state);
        Ok(state)
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        if let Some(task) = self.notification_task.write().take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("identifier", &self.core.identifier)
            .field("model", &self.core.model)
            .field("detached", &self.is_detached())
            .finish()
    }
}
