//! BLE connection management.
//!
//! Handles connecting to and maintaining connections with Adafruit boards.

use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

/// Default number of connection attempts.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 3;

/// Default delay between connection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Connection state for a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// Not connected to the board.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected to the board.
    Connected,
    /// Currently disconnecting.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Event for connection state changes.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
    /// The identifier of the peripheral.
    pub identifier: String,
    /// The new connection state.
    pub state: ConnectionState,
    /// When the state changed.
    pub timestamp: DateTime<Utc>,
}

/// Connection state of one link plus its change events.
struct LinkStatus {
    identifier: String,
    state: RwLock<ConnectionState>,
    connected_since: RwLock<Option<DateTime<Utc>>>,
    event_tx: broadcast::Sender<ConnectionEvent>,
}

impl LinkStatus {
    fn new(identifier: String) -> Self {
        let (event_tx, _) = broadcast::channel(16);
        Self {
            identifier,
            state: RwLock::new(ConnectionState::Disconnected),
            connected_since: RwLock::new(None),
            event_tx,
        }
    }

    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Move to `new_state`, emitting an event. Returns false if unchanged.
    fn set(&self, new_state: ConnectionState) -> bool {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);

        if old_state == new_state {
            return false;
        }

        *self.connected_since.write() = if new_state.is_connected() {
            Some(Utc::now())
        } else {
            None
        };

        debug!(
            "{}: connection state changed: {} -> {}",
            self.identifier, old_state, new_state
        );

        let _ = self.event_tx.send(ConnectionEvent {
            identifier: self.identifier.clone(),
            state: new_state,
            timestamp: Utc::now(),
        });
        true
    }
}

/// Spots a link loss in a stream of connection states.
///
/// A loss is a direct `Connected -> Disconnected` step. A requested
/// disconnect passes through `Disconnecting` and a failed connect through
/// `Connecting`, so neither counts.
#[derive(Debug, Clone, Copy)]
pub struct LinkLossDetector {
    previous: ConnectionState,
}

impl LinkLossDetector {
    /// Start from the link's current state.
    pub fn new(state: ConnectionState) -> Self {
        Self { previous: state }
    }

    /// Feed the next state. Returns true if it is a link loss.
    pub fn observe(&mut self, state: ConnectionState) -> bool {
        let previous = std::mem::replace(&mut self.previous, state);
        previous == ConnectionState::Connected && state == ConnectionState::Disconnected
    }
}

/// Manages the link to one board.
pub struct ConnectionManager {
    peripheral: Peripheral,
    status: Arc<LinkStatus>,
    /// Reconnect automatically on link loss.
    maintain_connection: Arc<RwLock<bool>>,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
}

impl ConnectionManager {
    /// Create a connection manager with the default retry parameters.
    pub fn new(peripheral: Peripheral) -> Self {
        Self::with_retry(peripheral, DEFAULT_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY)
    }

    /// Create a connection manager that tries `attempts` times (at least
    /// once), waiting `delay` between tries.
    pub fn with_retry(peripheral: Peripheral, attempts: u32, delay: Duration) -> Self {
        let status = LinkStatus::new(peripheral.id().to_string());

        Self {
            peripheral,
            status: Arc::new(status),
            maintain_connection: Arc::new(RwLock::new(false)),
            reconnect_attempts: attempts.max(1),
            reconnect_delay: delay,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.status.state()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// When the current link was established.
    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        *self.status.connected_since.read()
    }

    /// Subscribe to connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.status.event_tx.subscribe()
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Connect and discover services, retrying on failure.
    ///
    /// `maintain` records whether the owner should reconnect after a link
    /// loss; see [`is_maintaining_connection`](Self::is_maintaining_connection).
    pub async fn connect(&self, maintain: bool) -> Result<()> {
        let current_state = self.state();

        if current_state.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        if current_state.is_transitioning() {
            return Err(Error::ConnectionFailed {
                reason: "Connection already in progress".to_string(),
            });
        }

        *self.maintain_connection.write() = maintain;

        self.set_state(ConnectionState::Connecting);

        if self.peripheral.is_connected().await.unwrap_or(false) {
            info!("Peripheral already connected at BLE level");
            self.discover_services().await?;
            self.set_state(ConnectionState::Connected);
            return Ok(());
        }

        for attempt in 1..=self.reconnect_attempts {
            debug!("Connection attempt {} of {}", attempt, self.reconnect_attempts);

            match self.peripheral.connect().await {
                Ok(_) => {
                    info!("Connected to board");
                    self.discover_services().await?;
                    self.set_state(ConnectionState::Connected);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Connection attempt {} failed: {}", attempt, e);

                    if attempt < self.reconnect_attempts {
                        tokio::time::sleep(self.reconnect_delay).await;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        Err(Error::ConnectionFailed {
            reason: format!("Failed after {} attempts", self.reconnect_attempts),
        })
    }

    async fn discover_services(&self) -> Result<()> {
        if let Err(e) = self.peripheral.discover_services().await {
            error!("Failed to discover services: {}", e);
            let _ = self.peripheral.disconnect().await;
            self.set_state(ConnectionState::Disconnected);
            return Err(Error::DiscoveryFailed {
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// Disconnect from the board.
    pub async fn disconnect(&self) -> Result<()> {
        *self.maintain_connection.write() = false;

        let current_state = self.state();
        if matches!(
            current_state,
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnecting);

        let result = self.peripheral.disconnect().await;
        self.set_state(ConnectionState::Disconnected);

        match result {
            Ok(_) => {
                info!("Disconnected from board");
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                Err(Error::Bluetooth(e))
            }
        }
    }

    /// Check if we're maintaining the connection.
    pub fn is_maintaining_connection(&self) -> bool {
        *self.maintain_connection.read()
    }

    /// Record a link loss detected elsewhere, such as an adapter
    /// disconnect event or the end of the notification stream.
    ///
    /// Returns false if the link was already down.
    pub fn mark_disconnected(&self) -> bool {
        let changed = self.status.set(ConnectionState::Disconnected);
        if changed {
            warn!("Connection to {} lost", self.status.identifier);
        }
        changed
    }

    fn set_state(&self, new_state: ConnectionState) {
        self.status.set(new_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());

        assert!(ConnectionState::Connecting.is_transitioning());
        assert!(ConnectionState::Disconnecting.is_transitioning());
        assert!(!ConnectionState::Connected.is_transitioning());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "Connecting");
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_link_status_emits_changes() {
        let status = LinkStatus::new("board-1".to_string());
        let mut rx = status.event_tx.subscribe();

        assert!(status.set(ConnectionState::Connected));
        assert!(status.connected_since.read().is_some());
        assert!(!status.set(ConnectionState::Connected));

        // Link loss straight from Connected
        assert!(status.set(ConnectionState::Disconnected));
        assert!(status.connected_since.read().is_none());
        assert!(!status.set(ConnectionState::Disconnected));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.identifier, "board-1");
        assert_eq!(first.state, ConnectionState::Connected);
        assert_eq!(rx.try_recv().unwrap().state, ConnectionState::Disconnected);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_link_loss_detector() {
        let mut detector = LinkLossDetector::new(ConnectionState::Disconnected);
        assert!(!detector.observe(ConnectionState::Connecting));
        assert!(!detector.observe(ConnectionState::Connected));
        assert!(detector.observe(ConnectionState::Disconnected));

        // Failed reconnect
        assert!(!detector.observe(ConnectionState::Connecting));
        assert!(!detector.observe(ConnectionState::Disconnected));

        // Requested disconnect
        assert!(!detector.observe(ConnectionState::Connecting));
        assert!(!detector.observe(ConnectionState::Connected));
        assert!(!detector.observe(ConnectionState::Disconnecting));
        assert!(!detector.observe(ConnectionState::Disconnected));
    }

    #[test]
    fn test_link_status_feeds_detector() {
        let status = LinkStatus::new("board-2".to_string());
        let mut rx = status.event_tx.subscribe();
        let mut detector = LinkLossDetector::new(status.state());

        status.set(ConnectionState::Connecting);
        status.set(ConnectionState::Connected);
        status.set(ConnectionState::Disconnected);

        let losses = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|event| detector.observe(event.state))
            .count();
        assert_eq!(losses, 1);
    }
}
