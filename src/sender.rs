//! Outbound actions.
//!
//! Sends are fire-and-forget. When the session is not connected the call
//! fails immediately with [`SendError::NotConnected`]; nothing is queued and
//! nothing is retried.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SendError;
use crate::state::connection::{ConnectionManager, Connector};

/// Event name for game actions.
pub const PLAYER_ACTION_EVENT: &str = "player_action";

/// Event name for private questions to the game master.
pub const DIRECT_MESSAGE_EVENT: &str = "direct_message";

/// A game action, sent as `{type, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PlayerAction {
    StartGame,
    SubmitStatement {
        statement: String,
    },
    PublishClue {
        content: String,
    },
    SubmitVote {
        trust: Option<String>,
        suspect: Option<String>,
        #[serde(default)]
        statement: String,
    },
    SubmitAccusation {
        accused_id: String,
    },
    /// Any action this crate does not model
    #[serde(untagged)]
    Custom {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        payload: Value,
    },
}

impl PlayerAction {
    pub fn kind(&self) -> &str {
        match self {
            Self::StartGame => "start_game",
            Self::SubmitStatement { .. } => "submit_statement",
            Self::PublishClue { .. } => "publish_clue",
            Self::SubmitVote { .. } => "submit_vote",
            Self::SubmitAccusation { .. } => "submit_accusation",
            Self::Custom { kind, .. } => kind,
        }
    }
}

/// A private message to the game master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessageRequest {
    pub content: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DirectMessageRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extra: serde_json::Map::new(),
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Send a game action on the live channel.
    pub fn send_action(&mut self, action: &PlayerAction) -> Result<(), SendError> {
        let payload = serde_json::to_value(action)?;
        self.send(PLAYER_ACTION_EVENT, payload, action.kind())
    }

    /// Send a private message to the game master.
    pub fn send_direct_message(&mut self, message: &DirectMessageRequest) -> Result<(), SendError> {
        let payload = serde_json::to_value(message)?;
        self.send(DIRECT_MESSAGE_EVENT, payload, DIRECT_MESSAGE_EVENT)
    }

    fn send(&mut self, event: &str, payload: Value, what: &str) -> Result<(), SendError> {
        match self.emit(event, payload) {
            Ok(()) => {
                tracing::debug!(event, what, "sent");
                Ok(())
            }
            Err(err) => {
                tracing::error!(event, what, %err, "send failed");
                Err(err)
            }
        }
    }
}
