//! GATT characteristic handling.
//!
//! Provides reading, writing and subscribing to characteristics on Adafruit
//! boards, and the per-service enable sequence.
//!
//! Every Adafruit service carries its own measurement period and version
//! characteristics under the same UUIDs, so characteristics are cached by
//! `(service, characteristic)`.

use btleplug::api::{Characteristic, Peripheral as _, ValueNotification, WriteType};
use btleplug::platform::Peripheral;
use futures::stream::{Stream, StreamExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::ble::uuids::*;
use crate::error::{Error, Result};
use crate::protocol::{encode_period, readings::parse_u32};
use crate::sensor::BoardService;

/// Version assumed when a service has no version characteristic.
pub const DEFAULT_SERVICE_VERSION: u32 = 1;

/// Notification event from a characteristic.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    /// UUID of the characteristic that sent the notification.
    pub characteristic_uuid: Uuid,
    /// The notification data.
    pub data: Vec<u8>,
}

/// Handler for GATT characteristics on a board.
pub struct CharacteristicHandler {
    /// The peripheral to communicate with.
    peripheral: Peripheral,
    /// Cached characteristics by `(service, characteristic)`.
    characteristics: Arc<RwLock<HashMap<(Uuid, Uuid), Characteristic>>>,
    /// Channel for notification events.
    notification_tx: broadcast::Sender<NotificationEvent>,
    /// Whether we're currently listening for notifications.
    is_listening: Arc<RwLock<bool>>,
    /// Handle to the notification listener task.
    listener_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
    /// Signalled when the peripheral's notification stream ends.
    stream_closed: Arc<Notify>,
}

impl CharacteristicHandler {
    /// Create a new characteristic handler for a peripheral.
    ///
    /// Services must be discovered before using this handler.
    pub fn new(peripheral: Peripheral) -> Self {
        let (notification_tx, _) = broadcast::channel(256);

        Self {
            peripheral,
            characteristics: Arc::new(RwLock::new(HashMap::new())),
            notification_tx,
            is_listening: Arc::new(RwLock::new(false)),
            listener_handle: Arc::new(RwLock::new(None)),
            stream_closed: Arc::new(Notify::new()),
        }
    }

    /// Discover and cache all characteristics.
    pub async fn discover_characteristics(&self) -> Result<()> {
        let services = self.peripheral.services();

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in services {
            for characteristic in service.characteristics {
                trace!(
                    "Found characteristic: {} in service {}",
                    characteristic.uuid,
                    service.uuid
                );
                chars.insert((service.uuid, characteristic.uuid), characteristic);
            }
        }

        debug!("Discovered {} characteristics", chars.len());

        if chars.is_empty() {
            return Err(Error::DiscoveryFailed {
                reason: "No characteristics found".to_string(),
            });
        }

        Ok(())
    }

    /// Check if the board offers a service.
    pub fn has_service(&self, service_uuid: &Uuid) -> bool {
        self.characteristics
            .read()
            .keys()
            .any(|(service, _)| service == service_uuid)
    }

    /// Check if a characteristic exists in a service.
    pub fn has_characteristic(&self, service_uuid: &Uuid, uuid: &Uuid) -> bool {
        self.characteristics
            .read()
            .contains_key(&(*service_uuid, *uuid))
    }

    /// Get a characteristic by service and UUID.
    pub fn get_characteristic(&self, service_uuid: &Uuid, uuid: &Uuid) -> Result<Characteristic> {
        self.characteristics
            .read()
            .get(&(*service_uuid, *uuid))
            .cloned()
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Read a characteristic value.
    pub async fn read(&self, service_uuid: &Uuid, uuid: &Uuid) -> Result<Vec<u8>> {
        let characteristic = self.get_characteristic(service_uuid, uuid)?;

        let data = self
            .peripheral
            .read(&characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Read {} bytes from characteristic {}", data.len(), uuid);

        Ok(data)
    }

    /// Write to a characteristic.
    pub async fn write(
        &self,
        service_uuid: &Uuid,
        uuid: &Uuid,
        data: &[u8],
        with_response: bool,
    ) -> Result<()> {
        let characteristic = self.get_characteristic(service_uuid, uuid)?;

        let write_type = if with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        self.peripheral
            .write(&characteristic, data, write_type)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Wrote {} bytes to characteristic {}", data.len(), uuid);

        Ok(())
    }

    /// Subscribe to notifications from a characteristic.
    pub async fn subscribe(&self, service_uuid: &Uuid, uuid: &Uuid) -> Result<()> {
        let characteristic = self.get_characteristic(service_uuid, uuid)?;

        self.peripheral
            .subscribe(&characteristic)
            .await
            .map_err(|e| {
                debug!("Failed to subscribe to {}: {:?}", uuid, e);
                Error::Bluetooth(e)
            })?;

        debug!("Subscribed to notifications from {}", uuid);

        Ok(())
    }

    /// Unsubscribe from notifications from a characteristic.
    pub async fn unsubscribe(&self, service_uuid: &Uuid, uuid: &Uuid) -> Result<()> {
        let characteristic = self.get_characteristic(service_uuid, uuid)?;

        self.peripheral
            .unsubscribe(&characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        debug!("Unsubscribed from notifications from {}", uuid);

        Ok(())
    }

    /// Read a service's version, defaulting to 1 when it has none.
    pub async fn read_version(&self, service: BoardService) -> Result<u32> {
        let service_uuid = service.service_uuid();
        if !self.has_characteristic(&service_uuid, &SERVICE_VERSION_UUID) {
            return Ok(DEFAULT_SERVICE_VERSION);
        }
        let data = self.read(&service_uuid, &SERVICE_VERSION_UUID).await?;
        parse_u32(&data)
    }

    /// Write a service's measurement period. `None` disables the sensor.
    pub async fn set_period(&self, service: BoardService, period: Option<Duration>) -> Result<()> {
        let data = encode_period(period)?;
        self.write(&service.service_uuid(), &MEASUREMENT_PERIOD_UUID, &data, true)
            .await
    }

    /// Run the enable sequence for a service.
    ///
    /// Checks the service exists and reports a supported version, then for
    /// sensors writes the measurement period and subscribes to the data
    /// characteristic.
    pub async fn enable_service(&self, service: BoardService, period: Option<Duration>) -> Result<()> {
        let service_uuid = service.service_uuid();
        if !self.has_service(&service_uuid) {
            return Err(Error::ServiceNotFound {
                uuid: service_uuid.to_string(),
            });
        }

        let version = self.read_version(service).await?;
        let expected = service.expected_version();
        if version != expected {
            return Err(Error::UnsupportedVersion {
                service: service.name().to_string(),
                version,
                expected,
            });
        }

        let data_uuid = service.main_characteristic_uuid();
        if !self.has_characteristic(&service_uuid, &data_uuid) {
            return Err(Error::CharacteristicNotFound {
                uuid: data_uuid.to_string(),
            });
        }

        if service.sensor().is_some() {
            if let Some(period) = period {
                if self.has_characteristic(&service_uuid, &MEASUREMENT_PERIOD_UUID) {
                    self.set_period(service, Some(period)).await?;
                } else {
                    warn!("{} has no measurement period characteristic", service);
                }
            }
            self.subscribe(&service_uuid, &data_uuid).await?;
        }

        info!("Enabled {} service (version {})", service, version);
        Ok(())
    }

    /// Stop a sensor: disable its period and unsubscribe.
    pub async fn disable_service(&self, service: BoardService) -> Result<()> {
        if service.sensor().is_none() {
            return Ok(());
        }
        let service_uuid = service.service_uuid();
        if self.has_characteristic(&service_uuid, &MEASUREMENT_PERIOD_UUID) {
            if let Err(e) = self.set_period(service, None).await {
                debug!("Failed to disable period for {}: {}", service, e);
            }
        }
        self.unsubscribe(&service_uuid, &service.main_characteristic_uuid())
            .await
    }

    /// Read the microphone channel count.
    pub async fn read_sound_channels(&self) -> Result<usize> {
        let data = self.read(&SOUND_SERVICE_UUID, &SOUND_CHANNELS_UUID).await?;
        data.first()
            .map(|&c| c.max(1) as usize)
            .ok_or_else(|| Error::InvalidData {
                context: "Empty sound channel count".to_string(),
            })
    }

    /// Start listening for notifications.
    ///
    /// Notifications are sent through the channel returned by
    /// `subscribe_notifications()`.
    pub async fn start_notifications(&self) -> Result<()> {
        if *self.is_listening.read() {
            return Ok(());
        }

        *self.is_listening.write() = true;

        let peripheral = self.peripheral.clone();
        let is_listening = self.is_listening.clone();
        let notification_tx = self.notification_tx.clone();

        let stream_closed = self.stream_closed.clone();

        let handle = tokio::spawn(async move {
            let notifications = match peripheral.notifications().await {
                Ok(n) => n,
                Err(e) => {
                    error!("Failed to get notifications stream: {}", e);
                    return;
                }
            };

            debug!("Notification listener started");

            if forward_notifications(notifications, &notification_tx, &is_listening).await {
                warn!("Notification stream ended");
                *is_listening.write() = false;
                stream_closed.notify_one();
            }

            debug!("Notification listener stopped");
        });

        *self.listener_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop listening for notifications.
    pub async fn stop_notifications(&self) {
        *self.is_listening.write() = false;

        let handle = self.listener_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Signal that fires once the notification stream ends.
    ///
    /// A stream that ends without [`stop_notifications`](Self::stop_notifications)
    /// means the link is gone.
    pub fn stream_closed(&self) -> Arc<Notify> {
        self.stream_closed.clone()
    }

    /// Get a receiver for notification events.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<NotificationEvent> {
        self.notification_tx.subscribe()
    }

    /// Read a string value from a characteristic.
    pub async fn read_string(&self, service_uuid: &Uuid, uuid: &Uuid) -> Result<String> {
        let data = self.read(service_uuid, uuid).await?;
        String::from_utf8(data).map_err(|_| Error::InvalidData {
            context: format!("Invalid UTF-8 in characteristic {}", uuid),
        })
    }

    /// Read the manufacturer name.
    pub async fn read_manufacturer_name(&self) -> Result<String> {
        self.read_string(&DEVICE_INFO_SERVICE_UUID, &MANUFACTURER_NAME_UUID)
            .await
    }

    /// Read the model number.
    pub async fn read_model_number(&self) -> Result<String> {
        self.read_string(&DEVICE_INFO_SERVICE_UUID, &MODEL_NUMBER_UUID)
            .await
    }

    /// Read the firmware revision.
    pub async fn read_firmware_revision(&self) -> Result<String> {
        self.read_string(&DEVICE_INFO_SERVICE_UUID, &FIRMWARE_REVISION_UUID)
            .await
    }
}

impl Drop for CharacteristicHandler {
    fn drop(&mut self) {
        *self.is_listening.write() = false;
    }
}

/// Forward notifications until listening stops or the stream ends.
///
/// Returns true if the stream ended.
async fn forward_notifications<S>(
    mut notifications: S,
    notification_tx: &broadcast::Sender<NotificationEvent>,
    is_listening: &RwLock<bool>,
) -> bool
where
    S: Stream<Item = ValueNotification> + Unpin,
{
    while *is_listening.read() {
        tokio::select! {
            notification = notifications.next() => {
                let Some(notification) = notification else {
                    return true;
                };
                trace!(
                    "Notification from {}: {} bytes",
                    notification.uuid,
                    notification.value.len()
                );

                let _ = notification_tx.send(NotificationEvent {
                    characteristic_uuid: notification.uuid,
                    data: notification.value,
                });
            }
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_event_clone() {
        let event = NotificationEvent {
            characteristic_uuid: BAROMETRIC_PRESSURE_UUID,
            data: vec![1, 2, 3, 4],
        };
        let cloned = event.clone();
        assert_eq!(event.characteristic_uuid, cloned.characteristic_uuid);
        assert_eq!(event.data, cloned.data);
    }

    #[test]
    fn test_shared_characteristic_uuids() {
        // Every service uses the same period and version UUIDs
        assert_ne!(MEASUREMENT_PERIOD_UUID, SERVICE_VERSION_UUID);
        assert!(is_adafruit_uuid(&MEASUREMENT_PERIOD_UUID));
        assert_eq!(DEFAULT_SERVICE_VERSION, 1);
    }

    fn notification(uuid: Uuid, value: Vec<u8>) -> ValueNotification {
        ValueNotification { uuid, value }
    }

    #[tokio::test]
    async fn test_forward_until_stream_ends() {
        let (tx, mut rx) = broadcast::channel(8);
        let listening = RwLock::new(true);
        let stream = futures::stream::iter(vec![
            notification(LIGHT_UUID, vec![0, 0, 0x80, 0x3f]),
            notification(HUMIDITY_UUID, vec![0, 0, 0x20, 0x42]),
        ]);

        assert!(forward_notifications(stream, &tx, &listening).await);

        assert_eq!(rx.recv().await.unwrap().characteristic_uuid, LIGHT_UUID);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.characteristic_uuid, HUMIDITY_UUID);
        assert_eq!(second.data, vec![0, 0, 0x20, 0x42]);
    }

    #[tokio::test]
    async fn test_forward_stops_when_not_listening() {
        let (tx, _rx) = broadcast::channel(8);
        let listening = RwLock::new(false);
        let stream = futures::stream::pending::<ValueNotification>();

        assert!(!forward_notifications(stream, &tx, &listening).await);
    }
}
