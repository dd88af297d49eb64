//! The connection session: the single live game connection and the one
//! container window that may be open on it.
//!
//! State machine: `Disconnected → Connecting → Connected → Disconnected`,
//! with `Connecting → Disconnected` on error or timeout, and
//! `Connected → Disconnected` when the server drops a live connection. All
//! transitions go through the session mutex; long-running game actions only
//! clone the client handle out and never hold the lock while they run.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::{info, warn};

use crate::error::GameError;
use crate::game::{
    ConnectOptions, ConnectionEvent, ContainerWindow, GameClient, GameConnector, PendingConnection,
};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Parameters of the last connection attempt. Kept after disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Requested protocol version, `auto` when negotiated
    pub version: String,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 25565,
            username: String::new(),
            version: String::new(),
        }
    }
}

impl From<&ConnectOptions> for ConnectionParams {
    fn from(options: &ConnectOptions) -> Self {
        Self {
            host: options.host.clone(),
            port: options.port,
            username: options.username.clone(),
            version: options.version.clone().unwrap_or_else(|| "auto".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("already connected")]
    AlreadyConnected,

    #[error("a connection attempt is already in progress")]
    InProgress,

    #[error("{0}")]
    Game(#[from] GameError),

    #[error("Connection timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    #[error("not connected")]
    NotConnected,

    #[error("{0}")]
    Game(#[from] GameError),
}

/// Session fields. Only reachable through [`Session::lock`].
pub struct SessionState {
    status: ConnectionState,
    connection: Option<Arc<dyn GameClient>>,
    params: ConnectionParams,
    open_container: Option<Box<dyn ContainerWindow>>,
    /// Bumped on every successful login
    generation: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: ConnectionState::Disconnected,
            connection: None,
            params: ConnectionParams::default(),
            open_container: None,
            generation: 0,
        }
    }

    pub fn status(&self) -> ConnectionState {
        self.status
    }

    /// True only while connected with a live handle.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionState::Connected && self.connection.is_some()
    }

    /// The live client, if connected.
    pub fn client(&self) -> Option<Arc<dyn GameClient>> {
        if self.is_connected() {
            self.connection.clone()
        } else {
            None
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn container(&self) -> Option<&dyn ContainerWindow> {
        self.open_container.as_deref()
    }

    pub fn has_container(&self) -> bool {
        self.open_container.is_some()
    }

    /// Track a newly opened container, returning the one it replaces.
    pub fn set_container(
        &mut self,
        window: Box<dyn ContainerWindow>,
    ) -> Option<Box<dyn ContainerWindow>> {
        self.open_container.replace(window)
    }

    /// Stop tracking the open container.
    pub fn take_container(&mut self) -> Option<Box<dyn ContainerWindow>> {
        self.open_container.take()
    }

    fn clear(&mut self) {
        self.status = ConnectionState::Disconnected;
        self.connection = None;
        self.open_container = None;
    }
}

/// The process-wide session, shared as `Arc<Session>` with every tool.
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
        }
    }

    /// Lock the session for a state transition.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// The live client, or `None` when not connected.
    pub async fn client(&self) -> Option<Arc<dyn GameClient>> {
        self.state.lock().await.client()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.is_connected()
    }

    pub async fn status(&self) -> ConnectionState {
        self.state.lock().await.status()
    }

    pub async fn params(&self) -> ConnectionParams {
        self.state.lock().await.params().clone()
    }

    /// Open a connection and wait for the first of ready, error, or timeout.
    ///
    /// Rejected without side effects while connected or connecting. On
    /// timeout the in-flight connection is told to quit so nothing it emits
    /// later can reach the session. After ready, the remaining signals are
    /// watched in the background and a later error ends the session.
    pub async fn connect(
        &self,
        connector: &dyn GameConnector,
        options: ConnectOptions,
        timeout: Duration,
    ) -> Result<ConnectionParams, ConnectError> {
        {
            let mut state = self.state.lock().await;
            if state.is_connected() {
                return Err(ConnectError::AlreadyConnected);
            }
            if state.status == ConnectionState::Connecting {
                return Err(ConnectError::InProgress);
            }
            state.params = ConnectionParams::from(&options);
            state.status = ConnectionState::Connecting;
        }

        info!(
            host = %options.host,
            port = options.port,
            username = %options.username,
            backend = connector.name(),
            "Connecting to game server"
        );

        let PendingConnection { client, mut events } = match connector.connect(options).await {
            Ok(pending) => pending,
            Err(e) => {
                self.state.lock().await.clear();
                return Err(e.into());
            }
        };

        if let Err(e) = client.load_pathfinder() {
            quit_quietly(client.as_ref());
            self.state.lock().await.clear();
            return Err(e.into());
        }

        // Only the first signal answers the connect call.
        let first = tokio::time::timeout(timeout, events.recv()).await;

        let mut state = self.state.lock().await;
        match first {
            Ok(Some(ConnectionEvent::Ready)) => {
                state.connection = Some(client);
                state.status = ConnectionState::Connected;
                state.generation += 1;
                tokio::spawn(watch_connection(
                    Arc::clone(&self.state),
                    state.generation,
                    events,
                ));
                info!(host = %state.params.host, "Session ready");
                Ok(state.params.clone())
            }
            Ok(Some(ConnectionEvent::Error(message))) => {
                state.clear();
                warn!(error = %message, "Connection failed");
                Err(GameError::Rejected(message).into())
            }
            Ok(None) => {
                state.clear();
                Err(GameError::Disconnected("connection closed before login completed".into()).into())
            }
            Err(_) => {
                quit_quietly(client.as_ref());
                state.clear();
                warn!(timeout_secs = timeout.as_secs(), "Connection attempt timed out");
                Err(ConnectError::TimedOut(timeout))
            }
        }
    }

    /// Quit the live connection.
    ///
    /// If the client refuses to quit, the error is returned and the session
    /// stays connected.
    pub async fn disconnect(&self) -> Result<(), DisconnectError> {
        let mut state = self.state.lock().await;
        let client = state.client().ok_or(DisconnectError::NotConnected)?;
        client.quit()?;
        state.clear();
        info!("Disconnected from game server");
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Ends the session if the connection of `generation` reports an error.
async fn watch_connection(
    state: Arc<Mutex<SessionState>>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
) {
    while let Some(event) = events.recv().await {
        let ConnectionEvent::Error(message) = event else {
            continue;
        };
        let mut state = state.lock().await;
        if state.generation == generation && state.is_connected() {
            warn!(error = %message, "Connection lost");
            state.clear();
        }
        return;
    }
}

fn quit_quietly(client: &dyn GameClient) {
    if let Err(e) = client.quit() {
        warn!(error = %e, "Failed to abandon pending connection");
    }
}
