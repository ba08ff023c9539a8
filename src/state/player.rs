//! Players as seen in the public game state.
//!
//! A player's `id` is its identity and never changes. Every other field is
//! owned by the server and may arrive piecemeal: an online-status refresh
//! typically carries only `{id, online}`. [`PlayerUpdate`] models such a
//! partial entry and [`Player::apply`] folds it in field by field.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::lenient::{null_as_default, take_field};

/// Who controls a seat at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    /// A person at a client
    Human,
    /// A server-driven agent
    Ai,
    /// The game master
    #[serde(rename = "dm", alias = "moderator")]
    Moderator,
    /// Not reported yet, or a role this client does not know
    #[default]
    #[serde(other)]
    Unknown,
}

impl PlayerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
            Self::Moderator => "dm",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seat in the public game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identity
    pub id: String,

    /// Display name
    #[serde(rename = "name", default, deserialize_with = "null_as_default")]
    pub display_name: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub role: PlayerRole,

    #[serde(default, deserialize_with = "null_as_default")]
    pub online: bool,

    /// Server-defined public attributes (character name, status, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_info: Map<String, Value>,

    /// Per-seat fields this client does not model
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Player {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: PlayerRole) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
            online: false,
            public_info: Map::new(),
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Shallow-merge a partial entry for the same id. Fields the update
    /// leaves out keep their current value.
    pub fn apply(&mut self, update: &PlayerUpdate) {
        debug_assert_eq!(self.id, update.id);
        if let Some(name) = &update.display_name {
            self.display_name.clone_from(name);
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(online) = update.online {
            self.online = online;
        }
        if let Some(info) = &update.public_info {
            self.public_info.clone_from(info);
        }
        for (key, value) in &update.extra {
            if !value.is_null() {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }

    /// Character name from `public_info`, if the server provided one.
    pub fn character_name(&self) -> Option<&str> {
        self.public_info.get("character_name").and_then(Value::as_str)
    }
}

impl From<PlayerUpdate> for Player {
    fn from(update: PlayerUpdate) -> Self {
        Self {
            id: update.id,
            display_name: update.display_name.unwrap_or_default(),
            role: update.role.unwrap_or_default(),
            online: update.online.unwrap_or_default(),
            public_info: update.public_info.unwrap_or_default(),
            extra: update
                .extra
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect(),
        }
    }
}

/// A possibly partial player entry from a `game_state_update`.
///
/// `null` and a missing key both mean "unchanged". Only `id` is required; a
/// malformed field is logged and treated as unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerUpdate {
    pub id: String,

    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub role: Option<PlayerRole>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_info: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for PlayerUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let id = take_field(&mut fields, "id").ok_or_else(|| D::Error::missing_field("id"))?;
        Ok(Self {
            id,
            display_name: take_field(&mut fields, "name"),
            role: take_field(&mut fields, "type"),
            online: take_field(&mut fields, "online"),
            public_info: take_field(&mut fields, "public_info"),
            extra: fields.into_iter().collect(),
        })
    }
}

impl PlayerUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            role: None,
            online: None,
            public_info: None,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = Some(online);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Keyed merge of `updates` into `players`.
///
/// Known ids are merged in place and keep their position; unknown ids are
/// appended in the order they arrive. Players missing from `updates` are
/// left alone.
pub fn merge_players(players: &mut Vec<Player>, updates: &[PlayerUpdate]) {
    for update in updates {
        match players.iter_mut().find(|p| p.id == update.id) {
            Some(existing) => existing.apply(update),
            None => players.push(Player::from(update.clone())),
        }
    }
}
