//! The client a UI holds on to.
//!
//! [`GameClient`] pairs one [`ConnectionManager`] with one [`ClientState`].
//! The embedding app feeds every inbound frame to [`GameClient::handle`] and
//! reads projections back out. Nothing here is global; construct one client
//! per local player.

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{SendError, TransportError};
use crate::router::{self, RouteOutcome};
use crate::sender::{DirectMessageRequest, PlayerAction};
use crate::state::connection::{ConnectOutcome, ConnectionManager, ConnectionStatus, Connector, Session};
use crate::state::{ClientState, Player, PrivateInfo, PublicGameState};

#[derive(Debug)]
pub struct GameClient<C: Connector> {
    connection: ConnectionManager<C>,
    state: ClientState,
}

impl<C: Connector> GameClient<C> {
    pub fn new(config: ClientConfig, connector: C, player_id: impl Into<String>) -> Self {
        Self {
            connection: ConnectionManager::new(config, connector),
            state: ClientState::new(player_id),
        }
    }

    /// Open the channel for the local player.
    pub fn connect(&mut self) -> Result<ConnectOutcome, TransportError> {
        self.connection.connect(self.state.my_player_id())
    }

    /// Close the channel. Local state is kept so the UI can keep rendering it.
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    /// Feed one inbound frame.
    pub fn handle(&mut self, event: &str, payload: Value) -> RouteOutcome {
        router::route(&mut self.connection, &mut self.state, event, payload)
    }

    pub fn send_action(&mut self, action: &PlayerAction) -> Result<(), SendError> {
        self.connection.send_action(action)
    }

    /// Ask the game master a private question.
    pub fn send_direct_message(&mut self, content: impl Into<String>) -> Result<(), SendError> {
        self.connection
            .send_direct_message(&DirectMessageRequest::new(content))
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn session(&self) -> Option<&Session> {
        self.connection.session()
    }

    pub fn retries_exhausted(&self) -> bool {
        self.connection.retries_exhausted()
    }

    pub fn connection(&self) -> &ConnectionManager<C> {
        &self.connection
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn game(&self) -> &PublicGameState {
        &self.state.game
    }

    pub fn is_my_turn(&self) -> bool {
        self.state.is_my_turn()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.state.current_player()
    }

    pub fn my_info(&self) -> Option<PrivateInfo> {
        self.state.my_info_with_public_clues()
    }

    pub fn typing_players(&self) -> Vec<&str> {
        self.state.typing_players()
    }
}
