use arena_sim::game::entities::{Enemy, EnemyId, Player};
use arena_sim::game::weapons::WeaponId;
use arena_sim::game::{
    Command, FrameInput, GameEvent, MatchOutcome, MatchPhase, MatchState, SimConfig,
};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn start(enemy_count: u32, seed: u64) -> MatchState {
    let config = SimConfig {
        enemy_count,
        ..SimConfig::default()
    };
    let mut state = MatchState::new(config, seed);
    state.start_match();
    state
}

fn frame(state: &mut MatchState, dt: f32) -> Vec<GameEvent> {
    state.advance_frame(dt, FrameInput::default())
}

fn assert_invariants(state: &MatchState) {
    for enemy in state.enemies() {
        assert!((0..=enemy.max_health).contains(&enemy.health));
        assert_eq!(enemy.alive, enemy.health > 0);
    }
    let dead = state.enemies().iter().filter(|e| !e.alive).count() as u32;
    assert_eq!(state.kills(), dead);
    assert!(state.kills() <= state.total_enemies());
    assert!((0..=Player::MAX_HEALTH).contains(&state.player_health()));
    if state.player_health() == 0 {
        assert_eq!(state.phase(), MatchPhase::Over);
    }
}

#[test]
fn four_blaster_hits_kill_and_win_after_grace() {
    let mut state = start(1, 2024);
    let mut health = vec![state.enemies()[0].health];

    for _ in 0..4 {
        let target = state.enemies()[0].position;
        let events = state.fire_weapon(target + Vec3::X, Vec3::NEG_X);
        assert_eq!(events.len(), 1, "shot should pass the fire gate");

        frame(&mut state, 0.01);
        assert!(state.projectiles().is_empty(), "projectile should be consumed");
        health.push(state.enemies()[0].health);

        frame(&mut state, 0.12);
    }

    assert_eq!(health, vec![100, 75, 50, 25, 0]);
    assert!(!state.enemies()[0].alive);
    assert_eq!(state.kills(), 1);
    assert_eq!(state.phase(), MatchPhase::Playing);
    let pending = state.pending_transition().expect("victory should be scheduled");

    // The kill landed one 10ms frame before the 120ms frame above
    let until_due = pending.due_at - state.now();
    assert_eq!(until_due, 1_000_000 - 120_000);
    for _ in 0..87 {
        frame(&mut state, 0.01);
        assert_eq!(state.phase(), MatchPhase::Playing);
    }
    let events = frame(&mut state, 0.01);
    assert_eq!(state.phase(), MatchPhase::Over);
    assert_eq!(state.outcome(), Some(MatchOutcome::Victory));
    assert_eq!(
        events,
        vec![GameEvent::MatchOver {
            outcome: MatchOutcome::Victory
        }]
    );

    let stats = state.stats();
    assert_eq!(stats.shots_fired, 4);
    assert_eq!(stats.shots_hit, 4);
    assert_eq!(stats.accuracy, 1.0);
}

#[test]
fn direct_damage_follows_the_same_path() {
    let mut state = start(1, 5);
    frame(&mut state, 0.2);
    let mut seen = Vec::new();
    let mut events = Vec::new();
    for _ in 0..4 {
        events.extend(state.damage_enemy(EnemyId(0), 25));
        seen.push(state.enemies()[0].health);
    }
    assert_eq!(seen, vec![75, 50, 25, 0]);
    assert_eq!(state.kills(), 1);

    // Grace delay is measured from the killing blow at 200ms
    assert_eq!(
        events.last(),
        Some(&GameEvent::VictoryPending { due_at_ms: 1200 })
    );

    // Extra damage on a dead enemy changes nothing
    assert!(state.damage_enemy(EnemyId(0), 25).is_empty());
    assert_eq!(state.kills(), 1);

    for _ in 0..9 {
        frame(&mut state, 0.1);
    }
    assert_eq!(state.phase(), MatchPhase::Playing);
    frame(&mut state, 0.1);
    assert_eq!(state.phase(), MatchPhase::Over);
    assert_eq!(state.outcome(), Some(MatchOutcome::Victory));
}

#[test]
fn unknown_enemy_ids_are_ignored() {
    let mut state = start(2, 8);
    assert!(state.damage_enemy(EnemyId(77), 50).is_empty());
    state.clear_hit_flash(EnemyId(77));
    assert_eq!(state.kills(), 0);
    assert_invariants(&state);
}

#[test]
fn second_shot_inside_fire_interval_is_dropped() {
    let mut state = start(1, 3);
    let origin = Vec3::new(0.0, Player::EYE_HEIGHT, 0.0);

    assert_eq!(state.fire_weapon(origin, Vec3::Y).len(), 1);
    assert!(state.fire_weapon(origin, Vec3::Y).is_empty());
    assert_eq!(state.projectiles().len(), 1);

    // Blaster allows a shot every 125ms
    frame(&mut state, 0.1);
    assert!(state.fire_weapon(origin, Vec3::Y).is_empty());
    frame(&mut state, 0.025);
    assert_eq!(state.fire_weapon(origin, Vec3::Y).len(), 1);
    assert_eq!(state.projectiles().len(), 2);
}

#[test]
fn projectile_is_removed_after_two_hundred_units() {
    let mut state = start(1, 4);
    let origin = Vec3::new(0.0, Player::EYE_HEIGHT, 0.0);
    let events = state.fire_weapon(origin, Vec3::Y);
    let GameEvent::ShotFired { projectile_id, .. } = events[0] else {
        panic!("expected a shot");
    };

    // Blaster flies 20 units per 250ms frame
    for _ in 0..9 {
        frame(&mut state, 0.25);
    }
    assert_eq!(state.projectiles().len(), 1);
    assert!((state.projectiles()[0].distance_traveled - 180.0).abs() < 1e-3);

    let events = frame(&mut state, 0.25);
    assert!(state.projectiles().is_empty());
    assert!(events.contains(&GameEvent::ProjectileExpired { projectile_id }));
}

#[test]
fn enemy_contact_hits_once_per_second() {
    let mut state = start(1, 11);

    let mut first_hit = None;
    for _ in 0..1000 {
        let events = frame(&mut state, 0.05);
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerHit { .. }))
        {
            first_hit = Some(state.now());
            break;
        }
    }
    assert!(first_hit.is_some(), "enemy never reached the player");
    assert_eq!(state.player_health(), 90);

    let mut hits = 0;
    for _ in 0..60 {
        let events = frame(&mut state, 0.05);
        hits += events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerHit { .. }))
            .count();
    }
    assert_eq!(hits, 3);
    assert_eq!(state.player_health(), 60);
}

#[test]
fn standing_still_ends_in_defeat() {
    let mut state = start(3, 12);
    let mut over_events = 0;
    for _ in 0..5000 {
        let events = frame(&mut state, 0.1);
        over_events += events
            .iter()
            .filter(|e| matches!(e, GameEvent::MatchOver { .. }))
            .count();
        assert_invariants(&state);
        if state.phase() == MatchPhase::Over {
            break;
        }
    }
    assert_eq!(state.phase(), MatchPhase::Over);
    assert_eq!(state.outcome(), Some(MatchOutcome::Defeat));
    assert_eq!(state.player_health(), 0);
    assert_eq!(over_events, 1);

    // Nothing moves once the match is over
    let before: Vec<_> = state.enemies().iter().map(|e| e.position).collect();
    assert!(frame(&mut state, 0.1).is_empty());
    let after: Vec<_> = state.enemies().iter().map(|e| e.position).collect();
    assert_eq!(before, after);
}

#[test]
fn restart_during_grace_delay_discards_pending_victory() {
    let mut state = start(1, 21);
    let old_position = state.enemies()[0].position;
    let old_epoch = state.epoch();

    state.damage_enemy(EnemyId(0), Enemy::MAX_HEALTH);
    assert!(state.pending_transition().is_some());
    for _ in 0..5 {
        frame(&mut state, 0.1);
    }
    assert_eq!(state.phase(), MatchPhase::Playing);

    let events = state.restart_match();
    assert!(matches!(events[0], GameEvent::MatchStarted { .. }));
    assert!(state.epoch() > old_epoch);
    assert!(state.pending_transition().is_none());
    assert_eq!(state.kills(), 0);
    assert_eq!(state.player_health(), Player::MAX_HEALTH);
    let enemy = &state.enemies()[0];
    assert!(enemy.alive);
    assert_eq!(enemy.health, enemy.max_health);
    assert_ne!(enemy.position, old_position);

    for _ in 0..20 {
        frame(&mut state, 0.1);
    }
    assert_eq!(state.phase(), MatchPhase::Playing);
    assert_eq!(state.outcome(), None);
}

#[test]
fn dying_during_grace_delay_is_still_a_victory() {
    let mut state = start(1, 17);
    state.damage_enemy(EnemyId(0), Enemy::MAX_HEALTH);
    frame(&mut state, 0.1);
    assert_eq!(state.phase(), MatchPhase::Playing);
    assert!(state.pending_transition().is_some());

    let events = state.damage_player(Player::MAX_HEALTH);
    assert_eq!(state.player_health(), 0);
    assert_eq!(state.phase(), MatchPhase::Over);
    assert_eq!(state.outcome(), Some(MatchOutcome::Victory));
    assert_eq!(state.kills(), state.total_enemies());
    assert!(events.contains(&GameEvent::MatchOver {
        outcome: MatchOutcome::Victory
    }));

    // The pending transition is gone, so nothing fires later
    assert!(state.pending_transition().is_none());
    assert!(frame(&mut state, 1.0).is_empty());
    assert_eq!(state.outcome(), Some(MatchOutcome::Victory));
}

#[test]
fn restart_after_defeat_resets_everything() {
    let mut state = start(4, 31);
    state.switch_weapon(WeaponId::Cannon);
    state.damage_enemy(EnemyId(1), 100);
    state.damage_player(100);
    assert_eq!(state.phase(), MatchPhase::Over);
    assert!(state.switch_weapon(WeaponId::Blaster).is_empty());

    state.restart_match();
    assert_eq!(state.phase(), MatchPhase::Playing);
    assert_eq!(state.weapon(), WeaponId::Blaster);
    assert_eq!(state.kills(), 0);
    assert_eq!(state.enemies().len(), 4);
    assert!(state.enemies().iter().all(|e| e.alive));
    assert!(state.projectiles().is_empty());
    assert_eq!(state.now(), 0);
}

#[test]
fn random_command_streams_keep_invariants() {
    for seed in 0..20u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = start(5, seed);

        for _ in 0..400 {
            let command = match rng.gen_range(0..10) {
                0 => Command::DamageEnemy {
                    enemy_id: EnemyId(rng.gen_range(0..7)),
                    amount: rng.gen_range(-20..60),
                },
                1 => Command::DamagePlayer(rng.gen_range(-5..8)),
                2 => Command::SwitchWeapon(if rng.gen_bool(0.5) {
                    WeaponId::Blaster
                } else {
                    WeaponId::Cannon
                }),
                3 => {
                    let target = state.enemies()[rng.gen_range(0..5)].position;
                    let origin = state.player().position;
                    Command::FireWeapon {
                        origin,
                        aim: target - origin,
                    }
                }
                4 => Command::ClearHitFlash(EnemyId(rng.gen_range(0..5))),
                5 if rng.gen_bool(0.05) => Command::RestartMatch,
                _ => Command::AdvanceFrame {
                    dt: rng.gen_range(-0.02..0.3),
                    input: FrameInput::default(),
                },
            };
            state.apply(command);
            assert_invariants(&state);
        }
    }
}
