//! Connection lifecycle.
//!
//! The network library is abstracted behind [`Connector`] and [`Channel`].
//! [`ConnectionManager`] owns at most one open channel and the [`Session`]
//! that describes it. Reconnection is the transport's job; the manager only
//! observes it through [`TransportEvent`]s.
//!
//! ```text
//!                connect()
//!  ┌──────────────┐ ───────▶ ┌────────────┐  Connected  ┌───────────┐
//!  │ Disconnected │          │ Connecting │ ──────────▶ │ Connected │
//!  └──────────────┘ ◀─────── └────────────┘             └─────┬─────┘
//!        ▲         ConnectError                               │
//!        └────────────────────────────────────────────────────┘
//!                      Disconnected / ConnectError
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::error::{SendError, TransportError};

/// Session connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    /// Channel opened, waiting for the transport to confirm
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// A channel exists and has not been given up on.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The local player's connection session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Player id sent to the server as connection metadata
    pub player_id: String,

    pub status: ConnectionStatus,

    /// Transport-assigned id of the live socket
    pub socket_id: Option<String>,

    /// `connect_error`s since the last successful connect
    pub failed_attempts: u32,

    pub last_connected_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            status: ConnectionStatus::Connecting,
            socket_id: None,
            failed_attempts: 0,
            last_connected_at: None,
        }
    }
}

/// Everything the transport needs to open a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest<'a> {
    pub endpoint: &'a str,
    pub player_id: &'a str,
    pub websocket_only: bool,
    pub reconnect: ReconnectPolicy,
}

/// An open bidirectional message channel.
pub trait Channel {
    /// Send one named event.
    fn emit(&mut self, event: &str, payload: Value) -> Result<(), TransportError>;

    /// Tear the channel down. Must tolerate being called on a dead channel.
    fn close(&mut self);
}

/// Opens channels. Implemented by the embedding application over its
/// network library of choice.
pub trait Connector {
    type Channel: Channel;

    fn open(&mut self, request: &ConnectRequest<'_>) -> Result<Self::Channel, TransportError>;
}

/// Lifecycle notifications from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected { socket_id: Option<String> },
    ConnectError { message: String },
    Disconnected { reason: String },
}

#[derive(Debug, Default, Deserialize)]
struct LifecycleMeta {
    #[serde(default, alias = "sid", alias = "id")]
    socket_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl LifecycleMeta {
    /// Transport metadata is loosely shaped: a bare string, an object, or
    /// nothing at all.
    fn from_value(payload: Value) -> Self {
        match payload {
            Value::String(text) => Self {
                message: Some(text.clone()),
                reason: Some(text),
                ..Self::default()
            },
            other => serde_json::from_value(other).unwrap_or_default(),
        }
    }
}

/// Wire names of the transport lifecycle events.
pub const LIFECYCLE_EVENTS: &[&str] = &["connect", "connect_error", "disconnect"];

impl TransportEvent {
    pub fn is_lifecycle(name: &str) -> bool {
        LIFECYCLE_EVENTS.contains(&name)
    }

    /// Build a lifecycle event from its wire name and metadata.
    pub fn from_wire(name: &str, payload: Value) -> Option<Self> {
        if !Self::is_lifecycle(name) {
            return None;
        }
        let meta = LifecycleMeta::from_value(payload);
        match name {
            "connect" => Some(Self::Connected {
                socket_id: meta.socket_id,
            }),
            "connect_error" => Some(Self::ConnectError {
                message: meta.message.unwrap_or_default(),
            }),
            "disconnect" => Some(Self::Disconnected {
                reason: meta.reason.unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

/// Whether [`ConnectionManager::connect`] opened anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Opened,
    AlreadyConnected,
}

/// Owns the channel and session for one local player.
pub struct ConnectionManager<C: Connector> {
    config: ClientConfig,
    connector: C,
    channel: Option<C::Channel>,
    session: Option<Session>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(config: ClientConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            channel: None,
            session: None,
        }
    }

    /// Open a channel for `player_id`.
    ///
    /// No-op while a channel is connecting or connected. A dead channel
    /// left over from exhausted retries is closed and replaced.
    pub fn connect(&mut self, player_id: &str) -> Result<ConnectOutcome, TransportError> {
        if self.channel.is_some() && self.status().is_live() {
            tracing::info!(
                player_id,
                status = %self.status(),
                "already connected, ignoring connect"
            );
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        if let Some(mut stale) = self.channel.take() {
            stale.close();
        }

        let request = ConnectRequest {
            endpoint: &self.config.server_url,
            player_id,
            websocket_only: self.config.websocket_only,
            reconnect: self.config.reconnect,
        };
        tracing::info!(endpoint = request.endpoint, player_id, "connecting");

        let mut session = Session::new(player_id);
        match self.connector.open(&request) {
            Ok(channel) => {
                self.channel = Some(channel);
                self.session = Some(session);
                Ok(ConnectOutcome::Opened)
            }
            Err(err) => {
                tracing::error!(%err, player_id, "failed to open channel");
                session.status = ConnectionStatus::Disconnected;
                session.failed_attempts = 1;
                self.session = Some(session);
                Err(err)
            }
        }
    }

    /// Close the channel and forget the session. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
            tracing::info!("disconnected");
        }
        self.session = None;
    }

    /// Apply a lifecycle event. Returns the resulting status, or `None` if
    /// there is no session to apply it to.
    pub fn handle_event(&mut self, event: TransportEvent) -> Option<ConnectionStatus> {
        let max_attempts = self.config.reconnect.max_attempts;
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(?event, "lifecycle event without a session, ignoring");
            return None;
        };

        match event {
            TransportEvent::Connected { socket_id } => {
                tracing::info!(socket_id = socket_id.as_deref(), "connected");
                session.status = ConnectionStatus::Connected;
                session.socket_id = socket_id;
                session.failed_attempts = 0;
                session.last_connected_at = Some(Utc::now());
            }
            TransportEvent::ConnectError { message } => {
                session.status = ConnectionStatus::Disconnected;
                session.socket_id = None;
                session.failed_attempts = session.failed_attempts.saturating_add(1);
                tracing::error!(
                    %message,
                    attempt = session.failed_attempts,
                    "connection error"
                );
                if session.failed_attempts >= max_attempts {
                    tracing::warn!(
                        attempts = session.failed_attempts,
                        "transport retries exhausted, call connect to start over"
                    );
                }
            }
            TransportEvent::Disconnected { reason } => {
                tracing::warn!(%reason, "connection lost");
                session.status = ConnectionStatus::Disconnected;
                session.socket_id = None;
            }
        }

        Some(session.status)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.session
            .as_ref()
            .map_or(ConnectionStatus::Disconnected, |s| s.status)
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.player_id.as_str())
    }

    /// The transport has failed as many times in a row as it will retry.
    pub fn retries_exhausted(&self) -> bool {
        self.session.as_ref().is_some_and(|s| {
            s.status == ConnectionStatus::Disconnected
                && s.failed_attempts >= self.config.reconnect.max_attempts
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Emit on the live channel, failing fast when not connected.
    pub(crate) fn emit(&mut self, event: &str, payload: Value) -> Result<(), SendError> {
        if !self.is_connected() {
            return Err(SendError::NotConnected);
        }
        let channel = self.channel.as_mut().ok_or(SendError::NotConnected)?;
        channel.emit(event, payload)?;
        Ok(())
    }
}

impl<C: Connector> fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("server_url", &self.config.server_url)
            .field("session", &self.session)
            .field("has_channel", &self.channel.is_some())
            .finish()
    }
}

/// In-memory transport used by the unit and integration tests.
#[doc(hidden)]
pub mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::Value;

    use super::{Channel, ConnectRequest, Connector};
    use crate::error::TransportError;

    /// Shared record of everything the fake transport saw.
    #[derive(Debug, Default)]
    pub struct Wire {
        pub opened: Vec<(String, String)>,
        pub sent: Vec<(String, Value)>,
        pub closed: usize,
        pub fail_open: bool,
    }

    #[derive(Debug, Clone, Default)]
    pub struct FakeConnector {
        pub wire: Rc<RefCell<Wire>>,
    }

    impl FakeConnector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let connector = Self::default();
            connector.wire.borrow_mut().fail_open = true;
            connector
        }
    }

    #[derive(Debug)]
    pub struct FakeChannel {
        wire: Rc<RefCell<Wire>>,
    }

    impl Connector for FakeConnector {
        type Channel = FakeChannel;

        fn open(&mut self, request: &ConnectRequest<'_>) -> Result<FakeChannel, TransportError> {
            let mut wire = self.wire.borrow_mut();
            if wire.fail_open {
                return Err(TransportError::Connection("refused".to_string()));
            }
            wire.opened
                .push((request.endpoint.to_string(), request.player_id.to_string()));
            Ok(FakeChannel {
                wire: Rc::clone(&self.wire),
            })
        }
    }

    impl Channel for FakeChannel {
        fn emit(&mut self, event: &str, payload: Value) -> Result<(), TransportError> {
            self.wire.borrow_mut().sent.push((event.to_string(), payload));
            Ok(())
        }

        fn close(&mut self) {
            self.wire.borrow_mut().closed += 1;
        }
    }
}
