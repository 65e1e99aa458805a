//! Integration tests for the room actor and registry.
//!
//! Each test drives rooms through the same channels the transport layer
//! uses: an unbounded event receiver per player and intents routed
//! through the registry. Phase delays are shrunk so timer-driven
//! transitions complete in milliseconds.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use ricochet_protocol::{ClientIntent, MatchSettings, PlayerId, ServerEvent};
use ricochet_room::{RoomConfig, RoomError, RoomRegistry};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn fast_config() -> RoomConfig {
    RoomConfig {
        announce_delay: Duration::from_millis(20),
        loot_delay: Duration::from_millis(10),
        ..RoomConfig::default()
    }
}

type EventRx = mpsc::UnboundedReceiver<ServerEvent>;

async fn join(
    registry: &mut RoomRegistry,
    room: &str,
    id: u64,
    name: &str,
) -> Result<EventRx, RoomError> {
    let (tx, rx) = mpsc::unbounded_channel();
    registry
        .join(room, PlayerId(id), name.to_string(), tx)
        .await?;
    Ok(rx)
}

async fn recv(rx: &mut EventRx) -> ServerEvent {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Reads events until one matches, panicking on timeout.
async fn recv_until<F>(rx: &mut EventRx, pred: F) -> ServerEvent
where
    F: Fn(&ServerEvent) -> bool,
{
    loop {
        let event = recv(rx).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Seats `names` in a room, marks everyone ready, and returns the
/// event receivers in join order.
async fn lobby(
    registry: &mut RoomRegistry,
    room: &str,
    names: &[&str],
) -> Vec<EventRx> {
    let mut rxs = Vec::new();
    for (i, name) in names.iter().enumerate() {
        rxs.push(join(registry, room, i as u64 + 1, name).await.unwrap());
    }
    for i in 0..names.len() {
        registry
            .intent(PlayerId(i as u64 + 1), ClientIntent::ToggleReady)
            .await
            .unwrap();
    }
    rxs
}

#[tokio::test]
async fn test_join_creates_room_and_sends_roster() {
    let mut registry = RoomRegistry::new(fast_config());
    let mut rx = join(&mut registry, "lobby-1", 1, "alice").await.unwrap();

    match recv(&mut rx).await {
        ServerEvent::Joined {
            player_id,
            room,
            members,
            settings,
        } => {
            assert_eq!(player_id, PlayerId(1));
            assert_eq!(room, "lobby-1");
            assert_eq!(members.len(), 1);
            assert!(members[0].host);
            assert_eq!(settings, MatchSettings::default());
        }
        other => panic!("expected Joined, got {other:?}"),
    }
    assert_eq!(registry.room_count(), 1);
    assert_eq!(registry.room_of(PlayerId(1)), Some("lobby-1"));
}

#[tokio::test]
async fn test_room_capacity_enforced() {
    let mut registry = RoomRegistry::new(fast_config());
    for i in 1..=4 {
        join(&mut registry, "full", i, &format!("p{i}")).await.unwrap();
    }
    let err = join(&mut registry, "full", 5, "late").await.unwrap_err();
    assert!(matches!(err, RoomError::RoomFull(_)));
    assert_eq!(registry.room_of(PlayerId(5)), None);
}

#[tokio::test]
async fn test_duplicate_name_rejected_case_insensitively() {
    let mut registry = RoomRegistry::new(fast_config());
    join(&mut registry, "dup", 1, "Alice").await.unwrap();
    let err = join(&mut registry, "dup", 2, "alice").await.unwrap_err();
    assert!(matches!(err, RoomError::NameTaken(_)));
}

#[tokio::test]
async fn test_rejected_join_does_not_leak_fresh_room() {
    let mut registry = RoomRegistry::new(RoomConfig {
        capacity: 0,
        ..fast_config()
    });
    let err = join(&mut registry, "ghost", 1, "alice").await.unwrap_err();
    assert!(matches!(err, RoomError::RoomFull(_)));
    assert_eq!(registry.room_count(), 0);
}

#[tokio::test]
async fn test_host_migrates_to_earliest_remaining_member() {
    let mut registry = RoomRegistry::new(fast_config());
    join(&mut registry, "hm", 1, "alice").await.unwrap();
    let mut rx2 = join(&mut registry, "hm", 2, "bob").await.unwrap();
    join(&mut registry, "hm", 3, "carol").await.unwrap();

    registry.leave(PlayerId(1)).await.unwrap();

    recv_until(&mut rx2, |e| {
        matches!(e, ServerEvent::PlayerDisconnected { player_id } if *player_id == PlayerId(1))
    })
    .await;
    let roster = recv_until(&mut rx2, |e| matches!(e, ServerEvent::PlayerList { .. })).await;
    match roster {
        ServerEvent::PlayerList { members } => {
            assert_eq!(members.len(), 2);
            assert_eq!(members[0].id, PlayerId(2));
            assert!(members[0].host);
            assert!(!members[1].host);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_last_leave_removes_room() {
    let mut registry = RoomRegistry::new(fast_config());
    join(&mut registry, "tmp", 1, "alice").await.unwrap();
    assert_eq!(registry.room_count(), 1);

    registry.leave(PlayerId(1)).await.unwrap();
    assert_eq!(registry.room_count(), 0);
    assert!(matches!(
        registry.leave(PlayerId(1)).await.unwrap_err(),
        RoomError::NotInRoom(_)
    ));
}

#[tokio::test]
async fn test_chat_is_replayed_to_late_joiners() {
    let mut registry = RoomRegistry::new(fast_config());
    let _rx1 = join(&mut registry, "chatty", 1, "alice").await.unwrap();
    registry
        .intent(
            PlayerId(1),
            ClientIntent::Chat {
                text: "hello?".into(),
            },
        )
        .await
        .unwrap();

    let mut rx2 = join(&mut registry, "chatty", 2, "bob").await.unwrap();
    recv_until(&mut rx2, |e| matches!(e, ServerEvent::Joined { .. })).await;
    let chat = recv_until(&mut rx2, |e| matches!(e, ServerEvent::Chat { .. })).await;
    match chat {
        ServerEvent::Chat { from, name, text } => {
            assert_eq!(from, PlayerId(1));
            assert_eq!(name, "alice");
            assert_eq!(text, "hello?");
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_only_host_may_change_settings() {
    let mut registry = RoomRegistry::new(fast_config());
    let mut rx1 = join(&mut registry, "cfg", 1, "alice").await.unwrap();
    join(&mut registry, "cfg", 2, "bob").await.unwrap();

    let tweaked = MatchSettings {
        starting_hp: 6,
        ..MatchSettings::default()
    };
    // Non-host attempt is silently ignored.
    registry
        .intent(PlayerId(2), ClientIntent::UpdateSettings { settings: tweaked })
        .await
        .unwrap();
    registry
        .intent(PlayerId(1), ClientIntent::UpdateSettings { settings: tweaked })
        .await
        .unwrap();

    let update =
        recv_until(&mut rx1, |e| matches!(e, ServerEvent::SettingsUpdated { .. })).await;
    match update {
        ServerEvent::SettingsUpdated { settings } => assert_eq!(settings.starting_hp, 6),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_start_requires_host_and_ready_players() {
    let mut registry = RoomRegistry::new(fast_config());
    let mut rx1 = join(&mut registry, "gate", 1, "alice").await.unwrap();
    let mut rx2 = join(&mut registry, "gate", 2, "bob").await.unwrap();

    registry
        .intent(PlayerId(2), ClientIntent::StartGame)
        .await
        .unwrap();
    let reject = recv_until(&mut rx2, |e| matches!(e, ServerEvent::Rejected { .. })).await;
    assert!(matches!(
        reject,
        ServerEvent::Rejected {
            reason: ricochet_protocol::RejectReason::NotHost
        }
    ));

    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();
    let reject = recv_until(&mut rx1, |e| matches!(e, ServerEvent::Rejected { .. })).await;
    assert!(matches!(
        reject,
        ServerEvent::Rejected {
            reason: ricochet_protocol::RejectReason::PlayersNotReady
        }
    ));
}

#[tokio::test]
async fn test_game_start_runs_full_phase_sequence() {
    let mut registry = RoomRegistry::new(fast_config());
    let mut rxs = lobby(&mut registry, "seq", &["alice", "bob"]).await;

    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();

    // Every member sees the same sequence; follow it on one receiver.
    let rx = &mut rxs[0];
    recv_until(rx, |e| matches!(e, ServerEvent::GameStarted { .. })).await;
    let round = recv_until(rx, |e| matches!(e, ServerEvent::RoundAnnounced { .. })).await;
    match round {
        ServerEvent::RoundAnnounced { round, live, blank } => {
            assert_eq!(round, 1);
            assert!(live >= 1);
            assert!(live + blank >= 2 && live + blank <= 8);
        }
        _ => unreachable!(),
    }
    let loot = recv_until(rx, |e| matches!(e, ServerEvent::LootReceived { .. })).await;
    match loot {
        ServerEvent::LootReceived { items } => {
            assert_eq!(items.len(), MatchSettings::default().items_per_shipment as usize)
        }
        _ => unreachable!(),
    }
    recv_until(rx, |e| matches!(e, ServerEvent::LootAnnounced { .. })).await;
    recv_until(rx, |e| matches!(e, ServerEvent::TurnAnnounced { .. })).await;
}

#[tokio::test]
async fn test_join_rejected_while_game_in_progress() {
    let mut registry = RoomRegistry::new(fast_config());
    let mut rxs = lobby(&mut registry, "locked", &["alice", "bob"]).await;
    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();
    recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::GameStarted { .. })).await;

    let err = join(&mut registry, "locked", 3, "carol").await.unwrap_err();
    assert!(matches!(err, RoomError::GameInProgress(_)));
}

#[tokio::test]
async fn test_restart_returns_to_lobby_and_cancels_timers() {
    let mut registry = RoomRegistry::new(RoomConfig {
        announce_delay: Duration::from_millis(80),
        loot_delay: Duration::from_millis(10),
        ..RoomConfig::default()
    });
    let mut rxs = lobby(&mut registry, "reset", &["alice", "bob"]).await;

    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();
    recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::GameStarted { .. })).await;

    // Restart while the round-announce timer is still pending.
    registry
        .intent(PlayerId(1), ClientIntent::RequestRestart)
        .await
        .unwrap();
    recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::GameRestarted)).await;

    // Outwait the cancelled timer; no round may be announced afterwards.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let mut leftover = Vec::new();
    while let Ok(event) = rxs[0].try_recv() {
        leftover.push(event);
    }
    assert!(
        !leftover
            .iter()
            .any(|e| matches!(e, ServerEvent::RoundAnnounced { .. })),
        "stale round timer fired after restart: {leftover:?}"
    );
}

#[tokio::test]
async fn test_second_game_after_restart_starts_fresh() {
    let mut registry = RoomRegistry::new(fast_config());
    let mut rxs = lobby(&mut registry, "rematch", &["alice", "bob"]).await;

    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();
    // Let the first game run far enough that trays hold loot.
    let loot = recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::LootAnnounced { .. })).await;
    match loot {
        ServerEvent::LootAnnounced { players } => {
            assert!(players.iter().all(|p| !p.items.is_empty()));
        }
        _ => unreachable!(),
    }
    recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::TurnAnnounced { .. })).await;

    registry
        .intent(PlayerId(1), ClientIntent::RequestRestart)
        .await
        .unwrap();
    recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::GameRestarted)).await;

    // Ready flags survive the restart; the host can start right away.
    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();

    let started = recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::GameStarted { .. })).await;
    match started {
        ServerEvent::GameStarted { players, .. } => {
            assert_eq!(players.len(), 2);
            for p in &players {
                assert!(p.alive);
                assert_eq!(p.hp, p.max_hp);
                assert_eq!(p.hp, MatchSettings::default().starting_hp);
                assert!(p.items.is_empty());
                assert!(!p.handcuffed);
                assert!(!p.sawed);
            }
        }
        _ => unreachable!(),
    }

    // Round numbering starts over for the new game.
    let round = recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::RoundAnnounced { .. })).await;
    match round {
        ServerEvent::RoundAnnounced { round, .. } => assert_eq!(round, 1),
        _ => unreachable!(),
    }
    match recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::LootReceived { .. })).await {
        ServerEvent::LootReceived { items } => assert_eq!(items.len(), 2),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_mid_game_disconnect_ends_two_player_game() {
    let mut registry = RoomRegistry::new(fast_config());
    let mut rxs = lobby(&mut registry, "dc", &["alice", "bob"]).await;

    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();
    recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::TurnAnnounced { .. })).await;

    registry.leave(PlayerId(2)).await.unwrap();

    recv_until(&mut rxs[0], |e| {
        matches!(e, ServerEvent::PlayerDisconnected { player_id } if *player_id == PlayerId(2))
    })
    .await;
    let over = recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::GameOver { .. })).await;
    assert!(matches!(
        over,
        ServerEvent::GameOver { winner } if winner == PlayerId(1)
    ));
}

#[tokio::test]
async fn test_action_before_first_turn_is_rejected() {
    let mut registry = RoomRegistry::new(RoomConfig {
        announce_delay: Duration::from_millis(200),
        ..fast_config()
    });
    let mut rxs = lobby(&mut registry, "early", &["alice", "bob"]).await;

    registry
        .intent(PlayerId(1), ClientIntent::StartGame)
        .await
        .unwrap();
    recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::GameStarted { .. })).await;

    // The chamber hasn't even been announced; shooting is out of turn.
    registry
        .intent(
            PlayerId(1),
            ClientIntent::Shoot {
                target: PlayerId(2),
            },
        )
        .await
        .unwrap();
    let reject = recv_until(&mut rxs[0], |e| matches!(e, ServerEvent::Rejected { .. })).await;
    assert!(matches!(
        reject,
        ServerEvent::Rejected {
            reason: ricochet_protocol::RejectReason::NotYourTurn
        }
    ));
}

#[tokio::test]
async fn test_one_room_per_player() {
    let mut registry = RoomRegistry::new(fast_config());
    join(&mut registry, "a", 1, "alice").await.unwrap();
    let err = join(&mut registry, "b", 1, "alice").await.unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom(room) if room == "a"));
    assert_eq!(registry.room_of(PlayerId(1)), Some("a"));
}
