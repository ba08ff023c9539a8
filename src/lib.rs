//! Whodunit client state library
//!
//! Client-side state synchronization and reconnection for the Whodunit
//! social-deduction game. The server is authoritative; this crate keeps a
//! local replica of what it has said and sends player actions back.
//!
//! # Overview
//!
//! - **Connection Management** - One channel per local player, with status
//!   transitions driven by transport lifecycle events.
//!
//! - **Event Routing** - A fixed table maps each server event name to the
//!   reducer that applies it.
//!
//! - **State Reconciliation** - Full snapshots replace, partial updates
//!   merge, players merge by id, chat and clues append.
//!
//! - **Derived Views** - Turn eligibility, current player, and private info
//!   enriched with published clues. Computed on read.
//!
//! # Design Principles
//!
//! 1. **Server is authoritative** - Nothing is validated or predicted locally.
//!
//! 2. **Null never erases** - A partial update only touches what it carries.
//!
//! 3. **No networking** - The transport is supplied through [`Connector`].
//!
//! 4. **No globals** - A [`GameClient`] is built and owned by the caller.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use whodunit_state::{ClientConfig, GameClient, PlayerAction};
//! use whodunit_state::state::connection::testing::FakeConnector;
//!
//! let mut client = GameClient::new(ClientConfig::default(), FakeConnector::new(), "human_player_1");
//! client.connect().unwrap();
//! client.handle("connect", json!({}));
//!
//! client.handle("game_state_update", json!({
//!     "current_stage": "statement_1",
//!     "current_player_id": "human_player_1",
//! }));
//! assert!(client.is_my_turn());
//!
//! client
//!     .send_action(&PlayerAction::SubmitStatement { statement: "I was asleep".into() })
//!     .unwrap();
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod router;
pub mod sender;
pub mod state;

pub use client::GameClient;
pub use config::{ClientConfig, ReconnectPolicy};
pub use error::{DecodeError, SendError, TransportError};
pub use router::RouteOutcome;
pub use sender::{DirectMessageRequest, PlayerAction};
pub use state::*;
