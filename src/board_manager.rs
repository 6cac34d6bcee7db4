//! Board manager for discovering boards and owning the current session.
//!
//! The manager turns scanner discovery events into [`Board`] sessions and
//! keeps at most one of them as the *current board*, the board the
//! presentation layer reads from.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::ble::connection::{ConnectionState, LinkLossDetector};
use crate::ble::scanner::{BleScanner, BoardDiscoveryEvent};
use crate::board::Board;
use crate::config::BoardConfig;
use crate::error::{Error, Result};
use crate::observers::CallbackHandle;

/// Maximum number of boards tracked at once.
pub const MAX_BOARDS: usize = 16;

type BoardMap = Arc<RwLock<HashMap<String, Arc<Board>>>>;

/// Remembers which boards are stale so each goes stale only once.
#[derive(Debug, Default)]
struct StaleTracker {
    stale: HashSet<String>,
}

impl StaleTracker {
    /// Record a board's staleness. Returns true when it just went stale.
    fn update(&mut self, identifier: &str, stale: bool) -> bool {
        if stale {
            self.stale.insert(identifier.to_string())
        } else {
            self.stale.remove(identifier);
            false
        }
    }
}

/// Top-level session controller.
pub struct BoardManager {
    /// BLE scanner, absent for simulated sessions.
    scanner: Option<Arc<BleScanner>>,
    /// Discovered boards by BLE identifier.
    boards: BoardMap,
    /// The board in use.
    current: RwLock<Option<Arc<Board>>>,
    /// Configuration applied to boards built from discoveries.
    config: BoardConfig,
    board_discovered_tx: broadcast::Sender<Arc<Board>>,
    board_stale_tx: broadcast::Sender<Arc<Board>>,
    callback_counter: AtomicU64,
    background_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
    /// Watches the current board's link and reconnects after a loss.
    link_watch: RwLock<Option<tokio::task::JoinHandle<()>>>,
    is_running: Arc<AtomicBool>,
}

impl BoardManager {
    /// Create a manager on the first Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        Self::with_config(BoardConfig::default()).await
    }

    /// Create a manager whose boards use `config`.
    pub async fn with_config(config: BoardConfig) -> Result<Self> {
        let scanner = BleScanner::new().await?;
        Ok(Self::build(Some(Arc::new(scanner)), config))
    }

    /// Create a manager with no Bluetooth adapter around an existing board.
    ///
    /// Used for simulated sessions. Scanning fails with
    /// [`Error::BluetoothUnavailable`].
    pub fn with_current(board: Arc<Board>) -> Self {
        let manager = Self::build(None, board.config().clone());
        manager
            .boards
            .write()
            .insert(board.identifier().to_string(), board.clone());
        *manager.current.write() = Some(board);
        manager
    }

    fn build(scanner: Option<Arc<BleScanner>>, config: BoardConfig) -> Self {
        let (board_discovered_tx, _) = broadcast::channel(32);
        let (board_stale_tx, _) = broadcast::channel(32);

        Self {
            scanner,
            boards: Arc::new(RwLock::new(HashMap::new())),
            current: RwLock::new(None),
            config,
            board_discovered_tx,
            board_stale_tx,
            callback_counter: AtomicU64::new(0),
            background_handle: RwLock::new(None),
            link_watch: RwLock::new(None),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn scanner(&self) -> Result<&Arc<BleScanner>> {
        self.scanner.as_ref().ok_or(Error::BluetoothUnavailable)
    }

    /// Start scanning for boards.
    pub async fn start_scanning(&self) -> Result<()> {
        let scanner = self.scanner()?.clone();

        if self.is_running.load(Ordering::SeqCst) {
            debug!("Already scanning");
            return Ok(());
        }

        info!("Starting board manager scanning");

        scanner.start_scanning().await?;
        self.is_running.store(true, Ordering::SeqCst);

        let boards = self.boards.clone();
        let board_discovered_tx = self.board_discovered_tx.clone();
        let board_stale_tx = self.board_stale_tx.clone();
        let is_running = self.is_running.clone();
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            let mut rx = scanner.subscribe();
            let mut disconnections = scanner.subscribe_disconnections();
            let mut stale = StaleTracker::default();

            while is_running.load(Ordering::SeqCst) {
                tokio::select! {
                    result = rx.recv() => match result {
                        Ok(event) => {
                            Self::handle_discovery_event(event, &boards, &config, &board_discovered_tx);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!("Skipped {} discovery events", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    result = disconnections.recv() => match result {
                        Ok(identifier) => Self::handle_disconnection(&identifier, &boards),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!("Skipped {} disconnect events", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        Self::check_stale_boards(&boards, &mut stale, &board_stale_tx);
                    }
                }
            }

            debug!("Board manager background task ended");
        });

        *self.background_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop scanning for boards.
    pub async fn stop_scanning(&self) -> Result<()> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Ok(());
        }

        info!("Stopping board manager scanning");

        self.is_running.store(false, Ordering::SeqCst);
        if let Some(scanner) = &self.scanner {
            scanner.stop_scanning().await?;
        }

        let handle = self.background_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Check if scanning is active.
    pub fn is_scanning(&self) -> bool {
        self.scanner.as_ref().map(|s| s.is_scanning()).unwrap_or(false)
    }

    /// All discovered boards.
    pub fn boards(&self) -> HashMap<String, Arc<Board>> {
        self.boards.read().clone()
    }

    /// A discovered board by BLE identifier.
    pub fn board(&self, identifier: &str) -> Option<Arc<Board>> {
        self.boards.read().get(identifier).cloned()
    }

    /// Number of discovered boards.
    pub fn board_count(&self) -> usize {
        self.boards.read().len()
    }

    /// The closest board by signal strength.
    pub fn nearest_board(&self) -> Option<Arc<Board>> {
        self.boards
            .read()
            .values()
            .max_by_key(|b| b.rssi().unwrap_or(i16::MIN))
            .cloned()
    }

    /// Boards sorted by signal strength, strongest first.
    pub fn boards_by_signal(&self) -> Vec<Arc<Board>> {
        let mut boards: Vec<_> = self.boards.read().values().cloned().collect();
        boards.sort_by_key(|b| std::cmp::Reverse(b.rssi().unwrap_or(i16::MIN)));
        boards
    }

    /// Subscribe to board discovery events.
    pub fn subscribe_board_discovered(&self) -> broadcast::Receiver<Arc<Board>> {
        self.board_discovered_tx.subscribe()
    }

    /// Register a callback for discovered or updated boards.
    pub fn on_board_discovered<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(Arc<Board>) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.board_discovered_tx.subscribe();

        let handle = tokio::spawn(async move {
            while let Ok(board) = rx.recv().await {
                callback(board);
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    /// Subscribe to events for boards that stopped sending data.
    pub fn subscribe_board_stale(&self) -> broadcast::Receiver<Arc<Board>> {
        self.board_stale_tx.subscribe()
    }

    /// Connect a board if needed and make it the current board.
    ///
    /// A previous current board is disconnected.
    pub async fn start_board(&self, board: Arc<Board>) -> Result<()> {
        let previous = self.current.read().clone();
        if let Some(previous) = previous {
            if Arc::ptr_eq(&previous, &board) {
                debug!("{} is already the current board", board.identifier());
                return Ok(());
            }
        }

        if !board.is_detached() && board.connection_state() != ConnectionState::Connected {
            board.connect().await?;
        }

        self.boards
            .write()
            .insert(board.identifier().to_string(), board.clone());

        self.watch_link(&board);
        let previous = self.current.write().replace(board.clone());
        if let Some(previous) = previous {
            info!("Replacing current board {}", previous.identifier());
            if let Err(e) = previous.disconnect().await {
                warn!("Error disconnecting {}: {}", previous.identifier(), e);
            }
        }

        info!("Current board: {} {}", board.model(), board.identifier());
        Ok(())
    }

    /// The board in use.
    pub fn current_board(&self) -> Option<Arc<Board>> {
        self.current.read().clone()
    }

    /// Disconnect and forget the current board.
    pub async fn stop_current_board(&self) -> Result<()> {
        self.stop_link_watch();
        let board = self.current.write().take();
        match board {
            Some(board) => {
                info!("Stopping board {}", board.identifier());
                board.disconnect().await
            }
            None => Ok(()),
        }
    }

    /// Stop scanning and disconnect every board.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down board manager");

        self.stop_scanning().await?;
        self.stop_link_watch();
        self.current.write().take();

        let boards: Vec<_> = self.boards.read().values().cloned().collect();
        for board in boards {
            if let Err(e) = board.disconnect().await {
                warn!("Error disconnecting board {}: {}", board.identifier(), e);
            }
        }

        self.boards.write().clear();

        Ok(())
    }

    /// Reconnect `board` whenever its link drops while it should be
    /// maintained. Replaces the watch on the previous current board.
    fn watch_link(&self, board: &Arc<Board>) {
        let Some(mut events) = board.subscribe_connection() else {
            self.stop_link_watch();
            return;
        };
        let weak: Weak<Board> = Arc::downgrade(board);
        let mut detector = LinkLossDetector::new(board.connection_state());

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if !detector.observe(event.state) {
                            continue;
                        }
                        let Some(board) = weak.upgrade() else {
                            break;
                        };
                        if !board.is_maintaining_connection() {
                            info!("{} disconnected", board.identifier());
                            continue;
                        }
                        warn!("Lost {}, reconnecting", board.identifier());
                        if let Err(e) = board.reconnect().await {
                            warn!("Reconnecting {} failed: {}", board.identifier(), e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Skipped {} connection events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.link_watch.write().replace(task) {
            previous.abort();
        }
    }

    fn stop_link_watch(&self) {
        if let Some(task) = self.link_watch.write().take() {
            task.abort();
        }
    }

    fn handle_disconnection(identifier: &str, boards: &BoardMap) {
        let board = boards.read().get(identifier).cloned();
        match board {
            Some(board) => {
                if board.mark_link_lost() {
                    info!("Adapter reported {} disconnected", identifier);
                }
            }
            None => trace!("Disconnect from untracked peripheral {}", identifier),
        }
    }

    fn handle_discovery_event(
        event: BoardDiscoveryEvent,
        boards: &BoardMap,
        config: &BoardConfig,
        board_discovered_tx: &broadcast::Sender<Arc<Board>>,
    ) {
        let existing = boards.read().get(&event.identifier).cloned();

        let board = match existing {
            Some(board) => {
                board.update_rssi(event.rssi);
                board
            }
            None => {
                if boards.read().len() >= MAX_BOARDS {
                    warn!("Maximum board count ({}) reached, ignoring new board", MAX_BOARDS);
                    return;
                }

                let model = event.model();
                let board = Arc::new(Board::new(
                    event.identifier.clone(),
                    event.peripheral,
                    model,
                    config.clone(),
                ));
                board.update_rssi(event.rssi);

                info!(
                    "Discovered {} {} ({:?})",
                    model,
                    event.identifier,
                    event.local_name.as_deref().unwrap_or("unnamed")
                );

                boards.write().insert(event.identifier, board.clone());
                board
            }
        };

        let _ = board_discovered_tx.send(board);
    }

    fn check_stale_boards(
        boards: &BoardMap,
        tracker: &mut StaleTracker,
        board_stale_tx: &broadcast::Sender<Arc<Board>>,
    ) {
        for board in boards.read().values() {
            let stale = !board.is_detached()
                && board.connection_state() == ConnectionState::Connected
                && board.is_stale();
            if tracker.update(board.identifier(), stale) {
                warn!("{} went stale", board.identifier());
                let _ = board_stale_tx.send(board.clone());
            }
        }
    }
}

impl Drop for BoardManager {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
        self.stop_link_watch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::advertising::BoardModel;

    fn detached(id: &str) -> Arc<Board> {
        Arc::new(Board::detached(
            id,
            BoardModel::CircuitPlaygroundBluefruit,
            BoardConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_with_current() {
        let board = detached("sim-1");
        let manager = BoardManager::with_current(board.clone());

        let current = manager.current_board();
        assert!(current.is_some_and(|c| Arc::ptr_eq(&c, &board)));
        assert_eq!(manager.board_count(), 1);
        assert!(!manager.is_scanning());
        assert!(matches!(
            manager.start_scanning().await,
            Err(Error::BluetoothUnavailable)
        ));
        assert!(manager.stop_scanning().await.is_ok());
    }

    #[tokio::test]
    async fn test_start_board_replaces_current() {
        let first = detached("sim-1");
        let second = detached("sim-2");
        let manager = BoardManager::with_current(first);

        assert!(manager.start_board(second.clone()).await.is_ok());
        let current = manager.current_board();
        assert_eq!(current.map(|c| c.identifier().to_string()), Some("sim-2".to_string()));
        assert_eq!(manager.board_count(), 2);

        // Starting the current board again is a no-op
        assert!(manager.start_board(second).await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_and_shutdown() {
        let manager = BoardManager::with_current(detached("sim-1"));
        assert!(manager.stop_current_board().await.is_ok());
        assert!(manager.current_board().is_none());
        assert!(manager.stop_current_board().await.is_ok());

        assert!(manager.shutdown().await.is_ok());
        assert_eq!(manager.board_count(), 0);
    }

    #[test]
    fn test_nearest_board() {
        let near = detached("near");
        let far = detached("far");
        near.update_rssi(Some(-40));
        far.update_rssi(Some(-80));

        let manager = BoardManager::with_current(far.clone());
        manager.boards.write().insert("near".to_string(), near);

        assert_eq!(
            manager.nearest_board().map(|b| b.identifier().to_string()),
            Some("near".to_string())
        );
        let ordered: Vec<_> = manager
            .boards_by_signal()
            .iter()
            .map(|b| b.identifier().to_string())
            .collect();
        assert_eq!(ordered, vec!["near", "far"]);
    }

    #[test]
    fn test_stale_tracker_edges() {
        let mut tracker = StaleTracker::default();
        assert!(!tracker.update("a", false));
        assert!(tracker.update("a", true));
        assert!(!tracker.update("a", true));
        assert!(tracker.update("b", true));

        // Fresh again, then stale again
        assert!(!tracker.update("a", false));
        assert!(tracker.update("a", true));
    }

    #[test]
    fn test_detached_boards_never_go_stale() {
        let board = Arc::new(Board::detached(
            "sim-stale",
            BoardModel::CircuitPlaygroundBluefruit,
            BoardConfig::default().with_stale_timeout(Duration::ZERO),
        ));
        std::thread::sleep(Duration::from_millis(2));
        assert!(board.is_stale());

        let manager = BoardManager::with_current(board);
        let mut rx = manager.subscribe_board_stale();
        let mut tracker = StaleTracker::default();

        BoardManager::check_stale_boards(&manager.boards, &mut tracker, &manager.board_stale_tx);
        BoardManager::check_stale_boards(&manager.boards, &mut tracker, &manager.board_stale_tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnect_event_for_detached_board() {
        let board = detached("sim-1");
        let manager = BoardManager::with_current(board.clone());

        BoardManager::handle_disconnection("sim-1", &manager.boards);
        BoardManager::handle_disconnection("unknown", &manager.boards);

        assert!(!board.mark_link_lost());
        assert!(!board.is_maintaining_connection());
        assert_eq!(board.connection_state(), ConnectionState::Connected);
    }
}
