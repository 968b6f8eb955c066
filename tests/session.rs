use std::time::Duration;

use arena_sim::game::session::TickSettings;
use arena_sim::game::{
    GameMatch, MatchHandle, MatchOutcome, MatchPhase, MatchRegistry, SimConfig,
};
use arena_sim::ws::protocol::{ClientMsg, ServerMsg};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::timeout;
use tokio_test::assert_ok;

fn small_match(enemy_count: u32) -> (GameMatch, MatchHandle) {
    let config = SimConfig {
        enemy_count,
        ..SimConfig::default()
    };
    GameMatch::new(
        config,
        7,
        TickSettings {
            tick_rate: 20,
            snapshot_rate: 10,
        },
    )
}

/// Next message matching `pred`, skipping everything else
async fn next_matching<F>(rx: &mut broadcast::Receiver<ServerMsg>, mut pred: F) -> ServerMsg
where
    F: FnMut(&ServerMsg) -> bool,
{
    loop {
        match rx.recv().await {
            Ok(msg) if pred(&msg) => return msg,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => panic!("match task closed its channel"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn start_produces_playing_snapshot() {
    let (game_match, handle) = small_match(3);
    let mut rx = handle.snapshot_tx.subscribe();
    let task = tokio::spawn(game_match.run());

    assert_ok!(handle.input_tx.send(ClientMsg::StartMatch).await);

    let msg = timeout(
        Duration::from_secs(5),
        next_matching(&mut rx, |m| matches!(m, ServerMsg::Snapshot(_))),
    )
    .await
    .expect("no snapshot within five seconds");
    let ServerMsg::Snapshot(snapshot) = msg else {
        unreachable!()
    };
    assert_eq!(snapshot.phase, MatchPhase::Playing);
    assert_eq!(snapshot.enemies.len(), 3);
    assert_eq!(snapshot.total_enemies, 3);
    assert_eq!(handle.summary().phase, MatchPhase::Playing);

    assert_ok!(handle.input_tx.send(ClientMsg::Ping { t: 42 }).await);
    let pong = next_matching(&mut rx, |m| matches!(m, ServerMsg::Pong { .. })).await;
    assert!(matches!(pong, ServerMsg::Pong { t: 42 }));

    assert_ok!(handle.input_tx.send(ClientMsg::Leave).await);
    assert_ok!(task.await);
}

#[tokio::test(start_paused = true)]
async fn idle_player_is_eventually_defeated() {
    let (game_match, handle) = small_match(2);
    let mut rx = handle.snapshot_tx.subscribe();
    let task = tokio::spawn(game_match.run());

    assert_ok!(handle.input_tx.send(ClientMsg::StartMatch).await);

    let msg = timeout(
        Duration::from_secs(120),
        next_matching(&mut rx, |m| matches!(m, ServerMsg::MatchOver { .. })),
    )
    .await
    .expect("match never ended");
    let ServerMsg::MatchOver { outcome, stats } = msg else {
        unreachable!()
    };
    assert_eq!(outcome, MatchOutcome::Defeat);
    assert_eq!(stats.damage_taken, 100);
    assert_eq!(stats.kills, 0);

    let summary = handle.summary();
    assert_eq!(summary.phase, MatchPhase::Over);
    assert_eq!(summary.player_health, 0);

    // Restarting brings the match back to a fresh wave
    assert_ok!(handle.input_tx.send(ClientMsg::RestartMatch).await);
    next_matching(&mut rx, |m| {
        matches!(m, ServerMsg::Snapshot(s) if s.phase == MatchPhase::Playing)
    })
    .await;
    assert_eq!(handle.summary().player_health, 100);

    drop(rx);
    assert_ok!(handle.input_tx.send(ClientMsg::Leave).await);
    assert_ok!(task.await);
}

#[tokio::test(start_paused = true)]
async fn task_stops_when_every_sender_is_gone() {
    let registry = MatchRegistry::new();
    let (game_match, handle) = small_match(1);
    let id = handle.id;
    registry.insert(handle);
    assert_eq!(registry.active_matches(), 1);

    let task = tokio::spawn(game_match.run());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(registry.playing_matches(), 0);

    assert!(registry.remove(&id).is_some());
    assert!(registry.get(&id).is_none());

    assert_ok!(timeout(Duration::from_secs(1), task).await.expect("task kept running"));
}

#[test]
fn inputs_can_be_queued_before_the_task_runs() {
    let (_game_match, handle) = small_match(1);
    tokio_test::block_on(async {
        assert_ok!(handle.input_tx.send(ClientMsg::StartMatch).await);
        assert_ok!(handle.input_tx.send(ClientMsg::Ping { t: 1 }).await);
    });
    assert_eq!(handle.summary().phase, MatchPhase::Idle);
}
