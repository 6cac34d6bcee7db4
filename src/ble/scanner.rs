//! BLE scanning functionality.
//!
//! Provides the scanner for discovering Adafruit boards.

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace};

use crate::ble::advertising::{AdafruitManufacturerData, BoardModel};
use crate::ble::uuids::{is_adafruit_uuid, ADAFRUIT_MANUFACTURER_ID};
use crate::error::{Error, Result};

/// Event emitted when a board is discovered or its advertisement updated.
#[derive(Debug, Clone)]
pub struct BoardDiscoveryEvent {
    /// The BLE peripheral identifier.
    pub identifier: String,
    /// The peripheral handle.
    pub peripheral: Peripheral,
    /// Advertised local name.
    pub local_name: Option<String>,
    /// Parsed manufacturer data (if available).
    pub manufacturer_data: Option<AdafruitManufacturerData>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
}

impl BoardDiscoveryEvent {
    /// Board model identified from the advertisement.
    pub fn model(&self) -> BoardModel {
        self.manufacturer_data
            .as_ref()
            .map(|m| m.model())
            .unwrap_or_default()
    }
}

/// BLE scanner for discovering Adafruit boards.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
    /// Whether scanning is currently active.
    is_scanning: Arc<RwLock<bool>>,
    /// Discovered peripherals.
    discovered: Arc<RwLock<HashMap<String, BoardDiscoveryEvent>>>,
    /// Channel for discovery events.
    event_tx: broadcast::Sender<BoardDiscoveryEvent>,
    /// Identifiers of peripherals the adapter reports as disconnected.
    disconnect_tx: broadcast::Sender<String>,
    /// Handle to the scanning task.
    scan_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl BleScanner {
    /// Create a new BLE scanner on the first adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter))
    }

    /// Create a new BLE scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (disconnect_tx, _) = broadcast::channel(16);

        Self {
            adapter,
            is_scanning: Arc::new(RwLock::new(false)),
            discovered: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            disconnect_tx,
            scan_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Start scanning for boards.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning cannot be started.
    pub async fn start_scanning(&self) -> Result<()> {
        if *self.is_scanning.read() {
            debug!("Already scanning, ignoring start request");
            return Ok(());
        }

        info!("Starting BLE scan for Adafruit boards");

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        *self.is_scanning.write() = true;

        let adapter = self.adapter.clone();
        let is_scanning = self.is_scanning.clone();
        let discovered = self.discovered.clone();
        let event_tx = self.event_tx.clone();
        let disconnect_tx = self.disconnect_tx.clone();

        let handle = tokio::spawn(async move {
            let mut events = match adapter.events().await {
                Ok(events) => events,
                Err(e) => {
                    error!("Failed to get adapter events: {}", e);
                    return;
                }
            };

            while *is_scanning.read() {
                tokio::select! {
                    Some(event) = events.next() => {
                        Self::handle_event(event, &adapter, &discovered, &event_tx, &disconnect_tx)
                            .await;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        if !*is_scanning.read() {
                            break;
                        }
                    }
                }
            }

            debug!("Scan event loop ended");
        });

        *self.scan_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop scanning for boards.
    pub async fn stop_scanning(&self) -> Result<()> {
        if !*self.is_scanning.read() {
            debug!("Not scanning, ignoring stop request");
            return Ok(());
        }

        info!("Stopping BLE scan");

        *self.is_scanning.write() = false;

        self.adapter.stop_scan().await.map_err(Error::Bluetooth)?;

        let handle = self.scan_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Check if currently scanning.
    pub fn is_scanning(&self) -> bool {
        *self.is_scanning.read()
    }

    /// Get all discovered boards.
    pub fn discovered_boards(&self) -> HashMap<String, BoardDiscoveryEvent> {
        self.discovered.read().clone()
    }

    /// Subscribe to discovery events.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardDiscoveryEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to adapter disconnect events, by board identifier.
    pub fn subscribe_disconnections(&self) -> broadcast::Receiver<String> {
        self.disconnect_tx.subscribe()
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    async fn handle_event(
        event: btleplug::api::CentralEvent,
        adapter: &Adapter,
        discovered: &Arc<RwLock<HashMap<String, BoardDiscoveryEvent>>>,
        event_tx: &broadcast::Sender<BoardDiscoveryEvent>,
        disconnect_tx: &broadcast::Sender<String>,
    ) {
        use btleplug::api::CentralEvent;

        match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                trace!("Device seen: {:?}", id);
                Self::process_peripheral(adapter, id, discovered, event_tx).await;
            }
            CentralEvent::DeviceConnected(id) => {
                debug!("Device connected: {:?}", id);
            }
            CentralEvent::DeviceDisconnected(id) => {
                debug!("Device disconnected: {:?}", id);
                let _ = disconnect_tx.send(id.to_string());
            }
            CentralEvent::ManufacturerDataAdvertisement {
                id,
                manufacturer_data,
            } => {
                if manufacturer_data.contains_key(&ADAFRUIT_MANUFACTURER_ID) {
                    trace!("Adafruit advertisement: {:?}", id);
                    Self::process_peripheral(adapter, id, discovered, event_tx).await;
                }
            }
            CentralEvent::ServiceDataAdvertisement { .. } => {}
            CentralEvent::ServicesAdvertisement { .. } => {}
            CentralEvent::StateUpdate(_) => {}
        }
    }

    async fn process_peripheral(
        adapter: &Adapter,
        id: btleplug::platform::PeripheralId,
        discovered: &Arc<RwLock<HashMap<String, BoardDiscoveryEvent>>>,
        event_tx: &broadcast::Sender<BoardDiscoveryEvent>,
    ) {
        let peripheral = match adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return,
        };

        let raw = properties.manufacturer_data.get(&ADAFRUIT_MANUFACTURER_ID);
        let manufacturer_data = raw.and_then(|data| match AdafruitManufacturerData::parse(data) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Ignoring manufacturer data from {:?}: {}", id, e);
                None
            }
        });

        let advertises_adafruit_service = properties.services.iter().any(is_adafruit_uuid);
        if raw.is_none() && !advertises_adafruit_service {
            return;
        }

        let identifier = id.to_string();

        let event = BoardDiscoveryEvent {
            identifier: identifier.clone(),
            peripheral,
            local_name: properties.local_name,
            manufacturer_data,
            rssi: properties.rssi,
        };

        discovered.write().insert(identifier, event.clone());

        let _ = event_tx.send(event);
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        *self.is_scanning.write() = false;
    }
}
