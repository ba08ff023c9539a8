//! Chat history and typing indicators.
//!
//! Broadcast and direct messages are append-only. The client assigns an id
//! and timestamp to any message the server sent without one, and never
//! merges or dedupes entries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::lenient::null_as_default;

/// A message id. The server may send numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Issues client-side message ids: millisecond time that never goes
/// backwards, plus a random tiebreak.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, now: DateTime<Utc>) -> MessageId {
        self.last_millis = self.last_millis.max(now.timestamp_millis());
        let tiebreak: u32 = rand::random();
        MessageId::Text(format!("{}-{:08x}", self.last_millis, tiebreak))
    }
}

/// Parse RFC 3339, or a naive ISO 8601 timestamp taken as UTC. Anything
/// else is dropped and later replaced by the receipt time.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    match NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Ok(Some(naive.and_utc())),
        Err(err) => {
            tracing::debug!(%err, raw = %raw, "unparseable message timestamp");
            Ok(None)
        }
    }
}

/// A chat line, either broadcast to the table or sent privately.
///
/// Used for both the `new_message` and `dm_message` channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,

    /// Sender id (`system`, `dm` or a player id)
    #[serde(default)]
    pub from_id: Option<String>,

    /// Sender display name
    #[serde(default)]
    pub from_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,

    /// `system`, `chat`, `private`, ...
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
}

impl Message {
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            timestamp: None,
            from_id: None,
            from_name: None,
            content: content.into(),
            kind: kind.into(),
        }
    }

    #[must_use]
    pub fn from_sender(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.from_id = Some(id.into());
        self.from_name = Some(name.into());
        self
    }

    /// Fill in a missing id and timestamp. Values the server sent win.
    #[must_use]
    pub fn stamped(mut self, ids: &mut IdGenerator, now: DateTime<Utc>) -> Self {
        if self.id.is_none() {
            self.id = Some(ids.next_id(now));
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(now);
        }
        self
    }

    pub fn is_system(&self) -> bool {
        self.kind == "system"
    }
}

/// Private messages share the broadcast shape.
pub type DirectMessage = Message;

/// Typing state for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingIndicator {
    pub display_name: String,
    pub is_typing: bool,
}

/// Payload of `player_typing` / `player_done_typing`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypingEvent {
    pub player_id: String,
    #[serde(default)]
    pub player_name: Option<String>,
}

/// Last-write-wins typing indicators by player id. Entries never expire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingRoster {
    indicators: BTreeMap<String, TypingIndicator>,
}

impl TypingRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest typing state for `event.player_id`.
    ///
    /// A missing name keeps whatever name was known before.
    pub fn upsert(&mut self, event: TypingEvent, is_typing: bool) {
        let entry = self
            .indicators
            .entry(event.player_id)
            .or_insert_with(|| TypingIndicator {
                display_name: String::new(),
                is_typing,
            });
        if let Some(name) = event.player_name {
            entry.display_name = name;
        }
        entry.is_typing = is_typing;
    }

    pub fn get(&self, player_id: &str) -> Option<&TypingIndicator> {
        self.indicators.get(player_id)
    }

    pub fn is_typing(&self, player_id: &str) -> bool {
        self.get(player_id).is_some_and(|t| t.is_typing)
    }

    /// Names of everyone currently typing, ordered by player id.
    pub fn typing_names(&self) -> Vec<&str> {
        self.indicators
            .values()
            .filter(|t| t.is_typing)
            .map(|t| t.display_name.as_str())
            .collect()
    }

    /// Like [`typing_names`](Self::typing_names), skipping `player_id`.
    pub fn typing_names_except(&self, player_id: &str) -> Vec<&str> {
        self.indicators
            .iter()
            .filter(|(id, t)| t.is_typing && id.as_str() != player_id)
            .map(|(_, t)| t.display_name.as_str())
            .collect()
    }

    pub fn clear(&mut self) {
        self.indicators.clear();
    }
}
