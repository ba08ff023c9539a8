//! End-to-end flows through `GameClient` over an in-memory transport.

use pretty_assertions::assert_eq;
use serde_json::json;
use whodunit_state::state::connection::testing::FakeConnector;
use whodunit_state::{
    ClientConfig, ConnectOutcome, ConnectionStatus, GameClient, PendingAction, PlayerAction,
    RouteOutcome, SendError,
};

const ME: &str = "human_player_1";

fn connected_client() -> (GameClient<FakeConnector>, FakeConnector) {
    let connector = FakeConnector::new();
    let mut client = GameClient::new(
        ClientConfig::new("http://localhost:8765"),
        connector.clone(),
        ME,
    );
    assert_eq!(client.connect().unwrap(), ConnectOutcome::Opened);
    client.handle("connect", json!({"sid": "socket-1"}));
    (client, connector)
}

fn sync(client: &mut GameClient<FakeConnector>) {
    client.handle(
        "initial_state",
        json!({
            "gameState": {
                "current_stage": "alibi",
                "current_stage_label": "Alibi round",
                "current_player_id": "ai_player_1",
                "round": 1,
                "turn_order": ["ai_player_1", ME],
                "players": [
                    {"id": ME, "name": "Hong (Captain)", "type": "human", "online": true},
                    {"id": "ai_player_1", "name": "Zhang (Second Mate)", "type": "ai", "online": true}
                ],
                "pendingAction": "statement_ai_player_1",
                "votes": {},
                "accusations": {},
                "public_clues": []
            },
            "myInfo": {
                "character": {"name": "Hong (Captain)", "description": "runs the ship"},
                "relationships": [
                    {"name": "Zhang (Second Mate)", "desc": "resents you", "clues": []}
                ],
                "other_info": []
            },
            "messages": [
                {"from_id": "system", "from_name": "System", "content": "Game started", "type": "system",
                 "timestamp": "2025-01-01T20:00:00.123456"}
            ]
        }),
    );
}

#[test]
fn test_full_session() {
    let (mut client, connector) = connected_client();
    assert_eq!(client.status(), ConnectionStatus::Connected);
    assert_eq!(client.session().unwrap().socket_id.as_deref(), Some("socket-1"));

    sync(&mut client);
    assert_eq!(client.game().stage, "alibi");
    assert_eq!(client.current_player().unwrap().display_name, "Zhang (Second Mate)");
    assert_eq!(
        client.game().pending_action,
        PendingAction::Statement("ai_player_1".to_string())
    );
    assert!(!client.is_my_turn());
    assert!(client.state().messages[0].timestamp.is_some());

    client.handle(
        "game_state_update",
        json!({"current_player_id": ME, "pendingAction": "statement_human_player_1"}),
    );
    assert!(client.is_my_turn());

    client
        .send_action(&PlayerAction::SubmitStatement {
            statement: "I was in the engine room".to_string(),
        })
        .unwrap();

    client.handle(
        "game_state_update",
        json!({
            "current_stage": "voting_1",
            "pendingAction": "vote",
            "public_clues": [{"publisher_name": "Zhang (Second Mate)", "content": "found a knife"}]
        }),
    );
    assert!(client.is_my_turn());

    let info = client.my_info().unwrap();
    assert_eq!(
        info.relationships[0].clues,
        vec!["Publicly revealed: found a knife".to_string()]
    );
    assert_eq!(
        info.other_info,
        vec!["--- Public clues ---\n[Zhang (Second Mate) revealed] found a knife".to_string()]
    );
    assert!(client.state().my_info.as_ref().unwrap().other_info.is_empty());

    client
        .send_action(&PlayerAction::SubmitVote {
            trust: None,
            suspect: Some("ai_player_1".to_string()),
            statement: String::new(),
        })
        .unwrap();
    client.handle("game_state_update", json!({"votes": {ME: {"suspect": "ai_player_1"}}}));
    assert!(!client.is_my_turn());

    let wire = connector.wire.borrow();
    let kinds: Vec<&str> = wire
        .sent
        .iter()
        .map(|(_, payload)| payload["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["submit_statement", "submit_vote"]);
}

#[test]
fn test_partial_player_update_keeps_other_seats() {
    let (mut client, _) = connected_client();
    sync(&mut client);

    client.handle(
        "game_state_update",
        json!({"players": [{"id": "ai_player_1", "online": false}]}),
    );

    let players = &client.game().players;
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].id, ME);
    assert!(players[0].online);
    assert_eq!(players[1].display_name, "Zhang (Second Mate)");
    assert!(!players[1].online);
}

#[test]
fn test_malformed_public_clues_become_empty() {
    let (mut client, _) = connected_client();
    let outcome = client.handle("game_state_update", json!({"public_clues": "not-an-array"}));

    assert!(matches!(outcome, RouteOutcome::Applied("game_state_update")));
    assert!(client.game().public_clues.is_empty());
}

#[test]
fn test_disconnect_twice() {
    let (mut client, connector) = connected_client();

    client.disconnect();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    client.disconnect();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);

    assert_eq!(connector.wire.borrow().closed, 1);
    assert!(client.session().is_none());
}

#[test]
fn test_reconnect_resyncs_from_snapshot() {
    let (mut client, connector) = connected_client();
    sync(&mut client);

    client.handle("disconnect", json!("transport close"));
    assert!(matches!(
        client.send_action(&PlayerAction::StartGame),
        Err(SendError::NotConnected)
    ));

    for _ in 0..5 {
        client.handle("connect_error", json!({"message": "timeout"}));
    }
    assert!(client.retries_exhausted());

    assert_eq!(client.connect().unwrap(), ConnectOutcome::Opened);
    client.handle("connect", json!({}));
    assert!(client.is_connected());
    assert_eq!(connector.wire.borrow().opened.len(), 2);

    client.handle(
        "initial_state",
        json!({"gameState": {"current_stage": "final_accusation", "pendingAction": "accuse"}}),
    );
    assert_eq!(client.game().stage, "final_accusation");
    assert!(client.game().players.is_empty());
    assert_eq!(client.state().messages.len(), 1);
}

#[test]
fn test_chat_and_typing() {
    let (mut client, _) = connected_client();

    client.handle("player_typing", json!({"player_id": "ai_player_1", "player_name": "Zhang"}));
    client.handle("player_typing", json!({"player_id": ME, "player_name": "Hong"}));
    assert_eq!(client.typing_players(), vec!["Zhang"]);

    client.handle(
        "new_message",
        json!({"from_id": "ai_player_1", "from_name": "Zhang", "content": "Not me.", "type": "chat"}),
    );
    client.handle("player_done_typing", json!({"player_id": "ai_player_1"}));
    client.handle("dm_message", json!({"from_name": "DM", "content": "He lies.", "type": "private"}));

    assert!(client.typing_players().is_empty());
    assert_eq!(client.state().messages[0].content, "Not me.");
    assert_eq!(client.state().dm_messages[0].from_name.as_deref(), Some("DM"));

    client.send_direct_message("Who had the key?").unwrap();
}

#[test]
fn test_server_error_leaves_state_alone() {
    let (mut client, _) = connected_client();
    sync(&mut client);
    let before = client.game().clone();

    let outcome = client.handle("error", json!({"message": "not your turn"}));
    assert!(matches!(outcome, RouteOutcome::ServerError(ref m) if m == "not your turn"));
    assert_eq!(client.game(), &before);
}
