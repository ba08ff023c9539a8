//! Property-based tests for state reconciliation.
//!
//! Partial merges, keyed player merges and derived views must hold their
//! invariants for arbitrary snapshots and update sequences.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use serde_json::{json, Value};
use whodunit_state::{
    Clue, GameStateUpdate, PendingAction, Player, PlayerRole, PlayerUpdate, PrivateInfo,
    PublicGameState, Relationship,
};

fn player_id() -> impl Strategy<Value = String> {
    "p[0-5]"
}

fn role_strategy() -> impl Strategy<Value = PlayerRole> {
    prop_oneof![
        3 => Just(PlayerRole::Human),
        2 => Just(PlayerRole::Ai),
        1 => Just(PlayerRole::Moderator),
    ]
}

fn clue_strategy() -> impl Strategy<Value = Clue> {
    ("(Zhang|Lin|Liu|Hong)( \\(Mate\\))?", "[a-c]{1,2}")
        .prop_map(|(publisher, content)| Clue::new(publisher, content))
}

fn players_strategy() -> impl Strategy<Value = Vec<Player>> {
    prop::collection::btree_map(player_id(), (role_strategy(), any::<bool>()), 0..6).prop_map(
        |seats| {
            seats
                .into_iter()
                .map(|(id, (role, online))| {
                    let name = format!("Name {id}");
                    Player::new(id, name, role).with_online(online)
                })
                .collect()
        },
    )
}

fn ballots_strategy() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map(player_id(), Just(json!({"trust": "p0"})), 0..4)
}

fn pending_strategy() -> impl Strategy<Value = PendingAction> {
    prop_oneof![
        Just(PendingAction::None),
        Just(PendingAction::Vote),
        Just(PendingAction::Accuse),
        player_id().prop_map(PendingAction::Statement),
        Just(PendingAction::AiThinking),
    ]
}

fn game_strategy() -> impl Strategy<Value = PublicGameState> {
    (
        "(alibi|investigation_1|voting_1|final_accusation)",
        prop::option::of(player_id()),
        0u32..5,
        players_strategy(),
        pending_strategy(),
        ballots_strategy(),
        ballots_strategy(),
        prop::collection::vec(clue_strategy(), 0..5),
    )
        .prop_map(
            |(stage, actor, round, players, pending, votes, accusations, clues)| {
                PublicGameState {
                    stage,
                    current_actor_id: actor,
                    round_number: round,
                    players,
                    pending_action: pending,
                    votes,
                    accusations,
                    public_clues: clues,
                    ..PublicGameState::default()
                }
                .normalized()
            },
        )
}

fn clue_payload_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => prop::collection::vec(clue_strategy(), 0..4)
            .prop_map(|clues| serde_json::to_value(clues).unwrap()),
        1 => Just(json!("not-an-array")),
        1 => Just(json!([{"content": "missing publisher"}])),
        1 => Just(Value::Null),
    ]
}

fn private_info() -> PrivateInfo {
    let mut zhang = Relationship::new("Zhang (Second Mate)", "rival");
    zhang.add_clue("a");
    PrivateInfo {
        relationships: vec![zhang, Relationship::new("Lin (Singer)", "partner")],
        other_info: vec!["owns a pistol".to_string()],
        ..PrivateInfo::default()
    }
}

#[test]
fn prop_null_fields_never_overwrite() {
    proptest!(|(game in game_strategy())| {
        let update: GameStateUpdate = serde_json::from_value(json!({
            "current_stage": null,
            "current_stage_label": null,
            "current_player_id": null,
            "round": null,
            "turn_order": null,
            "players": null,
            "pendingAction": null,
            "votes": null,
            "accusations": null,
            "public_clues": null,
            "winner": null,
        }))
        .unwrap();

        prop_assert!(update.is_empty());
        prop_assert_eq!(game.merged(update), game);
    });
}

#[test]
fn prop_absent_players_keep_their_fields() {
    proptest!(|(
        game in game_strategy(),
        toggles in prop::collection::btree_map(player_id(), any::<bool>(), 0..4)
    )| {
        let updates: Vec<PlayerUpdate> = toggles
            .iter()
            .map(|(id, online)| PlayerUpdate::new(id.clone()).with_online(*online))
            .collect();
        let merged = game.merged(GameStateUpdate {
            players: Some(updates),
            ..GameStateUpdate::default()
        });

        for before in &game.players {
            let after = merged.player(&before.id).unwrap();
            match toggles.get(&before.id) {
                Some(online) => {
                    prop_assert_eq!(after.online, *online);
                    prop_assert_eq!(&after.display_name, &before.display_name);
                    prop_assert_eq!(after.role, before.role);
                }
                None => {
                    prop_assert_eq!(after, before);
                }
            }
        }

        let expected: BTreeSet<&str> = game
            .players
            .iter()
            .map(|p| p.id.as_str())
            .chain(toggles.keys().map(String::as_str))
            .collect();
        prop_assert_eq!(merged.players.len(), expected.len());

        let kept_order: Vec<&str> = merged.players.iter().map(|p| p.id.as_str()).take(game.players.len()).collect();
        let old_order: Vec<&str> = game.players.iter().map(|p| p.id.as_str()).collect();
        prop_assert_eq!(kept_order, old_order);
    });
}

#[test]
fn prop_vote_turn_depends_only_on_own_ballot() {
    proptest!(|(
        game in game_strategy(),
        others in prop::collection::btree_map("q[0-3]", Just(json!({})), 0..4),
        voted in any::<bool>()
    )| {
        let mut game = game;
        game.players.push(Player::new("me", "Me", PlayerRole::Human));
        game.pending_action = PendingAction::Vote;
        game.votes = others;
        if voted {
            game.votes.insert("me".to_string(), json!({"suspect": "p1"}));
        }

        prop_assert_eq!(game.is_turn_of("me"), !voted);
    });
}

#[test]
fn prop_ai_never_votes() {
    proptest!(|(game in game_strategy())| {
        let mut game = game;
        game.players.push(Player::new("bot", "Bot", PlayerRole::Ai));
        game.pending_action = PendingAction::Vote;
        prop_assert!(!game.is_turn_of("bot"));
    });
}

#[test]
fn prop_public_clues_never_shrink() {
    proptest!(|(
        game in game_strategy(),
        payloads in prop::collection::vec(clue_payload_strategy(), 0..8)
    )| {
        let mut game = game;
        for payload in payloads {
            let before = game.public_clues.clone();
            let update: GameStateUpdate =
                serde_json::from_value(json!({"public_clues": payload})).unwrap();
            game.merge(update);

            prop_assert!(game.public_clues.len() >= before.len());
            prop_assert_eq!(&game.public_clues[..before.len()], &before[..]);
        }
    });
}

#[test]
fn prop_enrichment_is_idempotent() {
    proptest!(|(clues in prop::collection::vec(clue_strategy(), 0..6))| {
        let info = private_info();
        let once = info.with_public_clues(&clues);

        prop_assert_eq!(&info, &private_info());
        prop_assert_eq!(&once, &info.with_public_clues(&clues));
        prop_assert_eq!(&once.with_public_clues(&clues), &once);

        for rel in &once.relationships {
            let unique: BTreeSet<&String> = rel.clues.iter().collect();
            prop_assert_eq!(unique.len(), rel.clues.len());
        }
    });
}

#[test]
fn prop_discovered_clues_are_appended_verbatim() {
    proptest!(|(batch in prop::collection::vec("[a-d]", 0..5))| {
        let mut state = whodunit_state::ClientState::new("me");
        state.add_discovered_clues(batch.clone());
        state.add_discovered_clues(batch.clone());

        let expected: Vec<String> = batch.iter().chain(batch.iter()).cloned().collect();
        prop_assert_eq!(state.discovered_clues, expected);
    });
}
