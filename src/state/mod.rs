//! Local replica of everything the server has told this client.
//!
//! - `connection` - channel lifecycle and the connection session
//! - `game` - public game state, partial merge, turn rules
//! - `player` - seats and keyed player merge
//! - `private` - the local player's secret sheet and its enriched view
//! - `chat` - message history and typing indicators
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           ClientState                             │
//! │                                                                   │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌─────────────────┐ │
//! │  │ PublicGameState  │  │   PrivateInfo    │  │  chat history   │ │
//! │  │                  │  │                  │  │                 │ │
//! │  │ full replace     │  │ full replace     │  │ append only     │ │
//! │  │ partial merge    │  │ enriched on read │  │                 │ │
//! │  └──────────────────┘  └──────────────────┘  └─────────────────┘ │
//! │                                                                   │
//! │  ┌──────────────────┐  ┌──────────────────┐                      │
//! │  │ discovered clues │  │  TypingRoster    │                      │
//! │  │ append only      │  │  last write wins │                      │
//! │  └──────────────────┘  └──────────────────┘                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reducers take `&mut self` and a decoded payload. Views take `&self` and
//! return fresh values.

pub mod chat;
pub mod connection;
pub mod game;
mod lenient;
pub mod player;
pub mod private;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

pub use chat::{DirectMessage, IdGenerator, Message, MessageId, TypingEvent, TypingIndicator, TypingRoster};
pub use connection::{
    Channel, ConnectOutcome, ConnectRequest, ConnectionManager, ConnectionStatus, Connector,
    Session, TransportEvent,
};
pub use game::{Clue, GameStateUpdate, PendingAction, PublicGameState, DEFAULT_STAGE};
pub use player::{Player, PlayerRole, PlayerUpdate};
pub use private::{CharacterSheet, PrivateInfo, Relationship, TimelineEntry};

/// Payload of `initial_state`. Each part that is present replaces the
/// local copy wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitialState {
    #[serde(rename = "gameState", default)]
    pub game_state: Option<PublicGameState>,
    #[serde(rename = "myInfo", default)]
    pub my_info: Option<PrivateInfo>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

/// Payload of `discovered_clues`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveredClues {
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub clues: Vec<String>,
}

/// Everything the client holds for one local player.
#[derive(Debug)]
pub struct ClientState {
    my_player_id: String,
    pub game: PublicGameState,
    pub my_info: Option<PrivateInfo>,
    pub messages: Vec<Message>,
    pub dm_messages: Vec<DirectMessage>,
    /// Clues found privately during investigation, duplicates kept
    pub discovered_clues: Vec<String>,
    pub typing: TypingRoster,
    ids: IdGenerator,
}

impl ClientState {
    pub fn new(my_player_id: impl Into<String>) -> Self {
        Self {
            my_player_id: my_player_id.into(),
            game: PublicGameState::new(),
            my_info: None,
            messages: Vec::new(),
            dm_messages: Vec::new(),
            discovered_clues: Vec::new(),
            typing: TypingRoster::new(),
            ids: IdGenerator::new(),
        }
    }

    pub fn my_player_id(&self) -> &str {
        &self.my_player_id
    }

    // Full replace

    pub fn set_game_state(&mut self, state: PublicGameState) {
        self.game = state.normalized();
    }

    pub fn set_my_info(&mut self, info: PrivateInfo) {
        self.my_info = Some(info);
    }

    pub fn set_messages(&mut self, messages: Vec<Message>) {
        let now = Utc::now();
        self.messages = messages
            .into_iter()
            .map(|m| m.stamped(&mut self.ids, now))
            .collect();
    }

    /// Resynchronize from an `initial_state` snapshot.
    pub fn apply_initial_state(&mut self, initial: InitialState) {
        if let Some(game) = initial.game_state {
            self.set_game_state(game);
        }
        if let Some(info) = initial.my_info {
            self.set_my_info(info);
        }
        if let Some(messages) = initial.messages {
            self.set_messages(messages);
        }
    }

    // Partial merge

    pub fn merge_game_state(&mut self, update: GameStateUpdate) {
        self.game.merge(update);
    }

    // Append

    pub fn add_message(&mut self, message: Message) {
        let message = message.stamped(&mut self.ids, Utc::now());
        self.messages.push(message);
    }

    pub fn add_dm_message(&mut self, message: DirectMessage) {
        let message = message.stamped(&mut self.ids, Utc::now());
        self.dm_messages.push(message);
    }

    pub fn add_discovered_clues(&mut self, clues: impl IntoIterator<Item = String>) {
        self.discovered_clues.extend(clues);
    }

    // Typing

    pub fn set_typing(&mut self, event: TypingEvent, is_typing: bool) {
        self.typing.upsert(event, is_typing);
    }

    // Derived views

    /// Whether the local player is expected to act now.
    pub fn is_my_turn(&self) -> bool {
        self.game.is_turn_of(&self.my_player_id)
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.game.current_player()
    }

    pub fn my_player(&self) -> Option<&Player> {
        self.game.player(&self.my_player_id)
    }

    /// Private info with public clues folded in; `None` until the server
    /// has sent any private info.
    pub fn my_info_with_public_clues(&self) -> Option<PrivateInfo> {
        self.my_info
            .as_ref()
            .map(|info| info.with_public_clues(&self.game.public_clues))
    }

    /// Display names of players currently typing, excluding the local one.
    pub fn typing_players(&self) -> Vec<&str> {
        self.typing.typing_names_except(&self.my_player_id)
    }

    /// JSON snapshot of the public state, for debugging and UI bridges.
    pub fn game_json(&self) -> Value {
        serde_json::to_value(&self.game).unwrap_or(Value::Null)
    }
}
