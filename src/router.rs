//! Inbound event routing.
//!
//! Every server event name maps to exactly one reducer in [`REDUCERS`].
//! A reducer decodes its payload and hands it to one [`ClientState`]
//! operation. The router keeps no state and does not buffer or reorder:
//! events are applied in the order the transport delivers them.
//!
//! Lifecycle names (`connect`, `connect_error`, `disconnect`) are handed to
//! the [`ConnectionManager`] instead, and `error` is returned to the caller
//! without touching state.

use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::state::connection::{ConnectionManager, ConnectionStatus, Connector, TransportEvent};
use crate::state::{ClientState, DiscoveredClues, TypingEvent};

/// A reducer: decode `payload`, apply it to the state.
pub type Reducer = fn(&mut ClientState, Value) -> Result<(), serde_json::Error>;

/// The dispatch table. Names are unique.
pub const REDUCERS: &[(&str, Reducer)] = &[
    ("initial_state", initial_state),
    ("game_state_update", game_state_update),
    ("new_message", new_message),
    ("dm_message", dm_message),
    ("private_update", private_update),
    ("discovered_clues", discovered_clues),
    ("player_typing", player_typing),
    ("player_done_typing", player_done_typing),
];

/// Event carrying a server-reported application error.
pub const ERROR_EVENT: &str = "error";

fn initial_state(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    state.apply_initial_state(serde_json::from_value(payload)?);
    Ok(())
}

fn game_state_update(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    state.merge_game_state(serde_json::from_value(payload)?);
    Ok(())
}

fn new_message(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    state.add_message(serde_json::from_value(payload)?);
    Ok(())
}

fn dm_message(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    state.add_dm_message(serde_json::from_value(payload)?);
    Ok(())
}

fn private_update(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    state.set_my_info(serde_json::from_value(payload)?);
    Ok(())
}

fn discovered_clues(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    let DiscoveredClues { clues } = serde_json::from_value(payload)?;
    state.add_discovered_clues(clues);
    Ok(())
}

fn player_typing(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    state.set_typing(serde_json::from_value::<TypingEvent>(payload)?, true);
    Ok(())
}

fn player_done_typing(state: &mut ClientState, payload: Value) -> Result<(), serde_json::Error> {
    state.set_typing(serde_json::from_value::<TypingEvent>(payload)?, false);
    Ok(())
}

/// Look up the reducer registered for `name`.
pub fn reducer_for(name: &str) -> Option<(&'static str, Reducer)> {
    REDUCERS.iter().find(|(n, _)| *n == name).copied()
}

/// What routing one event did.
#[derive(Debug)]
pub enum RouteOutcome {
    /// A reducer ran
    Applied(&'static str),
    /// A lifecycle event reached the connection manager; carries the new
    /// status, or `None` if there was no session
    Lifecycle(Option<ConnectionStatus>),
    /// The server reported an error for the user; state is unchanged
    ServerError(String),
    /// The payload did not decode; state is unchanged
    Rejected(DecodeError),
    /// Unknown event name
    Ignored,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
}

fn server_error_message(payload: Value) -> String {
    match payload {
        Value::String(message) => message,
        other => serde_json::from_value::<ErrorPayload>(other)
            .map(|e| e.message)
            .unwrap_or_default(),
    }
}

/// Route one inbound event.
pub fn route<C: Connector>(
    connection: &mut ConnectionManager<C>,
    state: &mut ClientState,
    name: &str,
    payload: Value,
) -> RouteOutcome {
    if TransportEvent::is_lifecycle(name) {
        let status = TransportEvent::from_wire(name, payload)
            .and_then(|event| connection.handle_event(event));
        return RouteOutcome::Lifecycle(status);
    }

    if name == ERROR_EVENT {
        let message = server_error_message(payload);
        tracing::warn!(%message, "server reported an error");
        return RouteOutcome::ServerError(message);
    }

    let Some((event, reducer)) = reducer_for(name) else {
        tracing::debug!(event = name, "ignoring unknown event");
        return RouteOutcome::Ignored;
    };

    match reducer(state, payload) {
        Ok(()) => {
            tracing::debug!(event, "applied");
            RouteOutcome::Applied(event)
        }
        Err(source) => {
            let err = DecodeError::new(event, source);
            tracing::warn!(%err, "dropping malformed event");
            RouteOutcome::Rejected(err)
        }
    }
}
