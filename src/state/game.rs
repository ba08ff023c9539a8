//! Public game state replica.
//!
//! The server owns the game; this is the client's cached copy. It changes in
//! two ways:
//!
//! - **Full replace** on (re)synchronization, see [`PublicGameState::normalized`].
//! - **Partial merge** of a [`GameStateUpdate`], see [`PublicGameState::merge`].
//!
//! A partial update never erases data it does not mention: absent and `null`
//! fields both mean "unchanged". Players merge by id, public clues only grow.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::lenient::{list_entries, null_as_default, take_field};
use super::player::{merge_players, Player, PlayerRole, PlayerUpdate};

/// Stage code before the server has started the game.
pub const DEFAULT_STAGE: &str = "waiting_for_players";

/// Prefix of the pending action that asks one player for a statement.
const STATEMENT_PREFIX: &str = "statement_";

/// What the server is waiting for.
///
/// Only [`PendingAction::Vote`] and [`PendingAction::Accuse`] open a
/// multi-actor turn; every other value leaves the turn with the current
/// speaker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingAction {
    #[default]
    None,
    /// Every human player casts a vote
    Vote,
    /// Every human player names a culprit
    Accuse,
    /// The named player owes a statement
    Statement(String),
    /// An AI player is composing its turn
    AiThinking,
    /// Anything this client does not recognize, kept verbatim
    Other(String),
}

impl PendingAction {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" => Self::None,
            "vote" => Self::Vote,
            "accuse" => Self::Accuse,
            "ai_thinking" => Self::AiThinking,
            _ => match raw.strip_prefix(STATEMENT_PREFIX) {
                Some(player_id) if !player_id.is_empty() => Self::Statement(player_id.to_string()),
                _ => Self::Other(raw.to_string()),
            },
        }
    }

    pub fn as_wire(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Vote => "vote".to_string(),
            Self::Accuse => "accuse".to_string(),
            Self::Statement(player_id) => format!("{STATEMENT_PREFIX}{player_id}"),
            Self::AiThinking => "ai_thinking".to_string(),
            Self::Other(raw) => raw.clone(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            other => f.write_str(&other.as_wire()),
        }
    }
}

impl Serialize for PendingAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for PendingAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Self::None, |raw| Self::parse(&raw)))
    }
}

/// A clue some player has made public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub publisher_name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,
}

impl Clue {
    pub fn new(publisher_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            publisher_name: publisher_name.into(),
            content: content.into(),
            publisher_id: None,
        }
    }

    /// Two clues are the same clue if publisher and text match.
    pub fn same_as(&self, other: &Clue) -> bool {
        self.publisher_name == other.publisher_name && self.content == other.content
    }
}

/// Append every clue in `incoming` that `clues` does not already hold.
///
/// Returns how many were appended.
pub fn union_clues(clues: &mut Vec<Clue>, incoming: &[Clue]) -> usize {
    let before = clues.len();
    for clue in incoming {
        if !clues.iter().any(|c| c.same_as(clue)) {
            clues.push(clue.clone());
        }
    }
    clues.len() - before
}

/// Decode a clue list. Anything that is not a list becomes empty and bad
/// entries are dropped.
fn clue_list(raw: Value) -> Vec<Clue> {
    list_entries(raw, "public_clues")
}

fn lenient_clue_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Clue>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(clue_list)
        .unwrap_or_default())
}

fn lenient_player_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Player>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(|raw| list_entries(raw, "players"))
        .unwrap_or_default())
}

fn default_stage() -> String {
    DEFAULT_STAGE.to_string()
}

fn stage_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_stage))
}

/// The client's replica of the shared game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicGameState {
    /// Stage code (`alibi`, `investigation_1`, `voting_1`, ...)
    #[serde(
        rename = "current_stage",
        default = "default_stage",
        deserialize_with = "stage_or_default"
    )]
    pub stage: String,

    /// Human-readable stage name
    #[serde(rename = "current_stage_label", default, skip_serializing_if = "Option::is_none")]
    pub stage_label: Option<String>,

    /// Player whose turn it is to speak
    #[serde(rename = "current_player_id", default)]
    pub current_actor_id: Option<String>,

    #[serde(rename = "round", default, deserialize_with = "null_as_default")]
    pub round_number: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub turn_order: Vec<String>,

    /// Seats, at most one per id
    #[serde(default, deserialize_with = "lenient_player_list")]
    pub players: Vec<Player>,

    #[serde(rename = "pendingAction", default)]
    pub pending_action: PendingAction,

    /// Ballots by voter id
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: BTreeMap<String, Value>,

    /// Final accusations by accuser id
    #[serde(default, deserialize_with = "null_as_default")]
    pub accusations: BTreeMap<String, Value>,

    #[serde(default, deserialize_with = "lenient_clue_list")]
    pub public_clues: Vec<Clue>,

    /// Top-level fields this client does not model
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for PublicGameState {
    fn default() -> Self {
        Self {
            stage: default_stage(),
            stage_label: None,
            current_actor_id: None,
            round_number: 0,
            turn_order: Vec::new(),
            players: Vec::new(),
            pending_action: PendingAction::None,
            votes: BTreeMap::new(),
            accusations: BTreeMap::new(),
            public_clues: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// A partial `game_state_update` payload.
///
/// Every field is optional; `None` leaves the local value alone. Decoding
/// is field by field: a malformed field is logged and left as `None`, a
/// player entry without an id is dropped, and a `public_clues` value that is
/// not a list decodes as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameStateUpdate {
    #[serde(rename = "current_stage", skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    #[serde(rename = "current_stage_label", skip_serializing_if = "Option::is_none")]
    pub stage_label: Option<String>,

    #[serde(rename = "current_player_id", skip_serializing_if = "Option::is_none")]
    pub current_actor_id: Option<String>,

    #[serde(rename = "round", skip_serializing_if = "Option::is_none")]
    pub round_number: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_order: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerUpdate>>,

    #[serde(rename = "pendingAction", skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<BTreeMap<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accusations: Option<BTreeMap<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_clues: Option<Vec<Clue>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for GameStateUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            stage: take_field(&mut fields, "current_stage"),
            stage_label: take_field(&mut fields, "current_stage_label"),
            current_actor_id: take_field(&mut fields, "current_player_id"),
            round_number: take_field(&mut fields, "round"),
            turn_order: take_field(&mut fields, "turn_order"),
            players: take_field::<Value>(&mut fields, "players")
                .map(|raw| list_entries(raw, "players")),
            pending_action: take_field(&mut fields, "pendingAction"),
            votes: take_field(&mut fields, "votes"),
            accusations: take_field(&mut fields, "accusations"),
            public_clues: take_field::<Value>(&mut fields, "public_clues").map(clue_list),
            extra: fields.into_iter().collect(),
        })
    }
}

impl GameStateUpdate {
    /// True if applying this update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.stage.is_none()
            && self.stage_label.is_none()
            && self.current_actor_id.is_none()
            && self.round_number.is_none()
            && self.turn_order.is_none()
            && self.players.is_none()
            && self.pending_action.is_none()
            && self.votes.is_none()
            && self.accusations.is_none()
            && self.public_clues.is_none()
            && self.extra.values().all(Value::is_null)
    }
}

impl PublicGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce the collection invariants on a snapshot taken verbatim from
    /// the server: one player per id (last entry wins) and no repeated
    /// public clue.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let mut players: Vec<Player> = Vec::with_capacity(self.players.len());
        for player in self.players.drain(..) {
            match players.iter_mut().find(|p| p.id == player.id) {
                Some(existing) => *existing = player,
                None => players.push(player),
            }
        }
        self.players = players;

        let mut clues = Vec::with_capacity(self.public_clues.len());
        union_clues(&mut clues, &self.public_clues);
        self.public_clues = clues;

        self.extra.retain(|_, v| !v.is_null());
        self
    }

    /// Apply a partial update in place.
    pub fn merge(&mut self, update: GameStateUpdate) {
        let GameStateUpdate {
            stage,
            stage_label,
            current_actor_id,
            round_number,
            turn_order,
            players,
            pending_action,
            votes,
            accusations,
            public_clues,
            extra,
        } = update;

        if let Some(stage) = stage {
            self.stage = stage;
        }
        if let Some(label) = stage_label {
            self.stage_label = Some(label);
        }
        if let Some(actor) = current_actor_id {
            self.current_actor_id = Some(actor);
        }
        if let Some(round) = round_number {
            self.round_number = round;
        }
        if let Some(order) = turn_order {
            self.turn_order = order;
        }
        if let Some(players) = players {
            merge_players(&mut self.players, &players);
        }
        if let Some(pending) = pending_action {
            self.pending_action = pending;
        }
        if let Some(votes) = votes {
            self.votes = votes;
        }
        if let Some(accusations) = accusations {
            self.accusations = accusations;
        }
        if let Some(clues) = public_clues {
            union_clues(&mut self.public_clues, &clues);
        }
        for (key, value) in extra {
            if !value.is_null() {
                self.extra.insert(key, value);
            }
        }
    }

    /// Pure form of [`merge`](Self::merge).
    #[must_use]
    pub fn merged(&self, update: GameStateUpdate) -> Self {
        let mut next = self.clone();
        next.merge(update);
        next
    }

    /// Look up a player by id.
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// The player whose turn it is to speak, if known.
    pub fn current_player(&self) -> Option<&Player> {
        self.current_actor_id
            .as_deref()
            .and_then(|id| self.player(id))
    }

    /// Whether `player_id` is expected to act now.
    ///
    /// During a vote or accusation every human who has not yet submitted is
    /// eligible. Otherwise only the current speaker is.
    pub fn is_turn_of(&self, player_id: &str) -> bool {
        let ballots = match self.pending_action {
            PendingAction::Vote => &self.votes,
            PendingAction::Accuse => &self.accusations,
            _ => return self.current_actor_id.as_deref() == Some(player_id),
        };
        self.player(player_id)
            .is_some_and(|p| p.role == PlayerRole::Human && !ballots.contains_key(player_id))
    }

    /// Number of human seats that still owe a ballot in the current vote or
    /// accusation. Zero outside those phases.
    pub fn outstanding_ballots(&self) -> usize {
        let ballots = match self.pending_action {
            PendingAction::Vote => &self.votes,
            PendingAction::Accuse => &self.accusations,
            _ => return 0,
        };
        self.players
            .iter()
            .filter(|p| p.role.is_human() && !ballots.contains_key(&p.id))
            .count()
    }
}
