// End-to-end game scenarios driven on the headless platform.
// Native only: the manual scheduler stands in for setInterval/rAF, so no
// browser APIs are touched.

#![cfg(not(target_arch = "wasm32"))]

use cursed_corridors::game::{KEY_PICKED_MESSAGE, VICTORY_MESSAGE};
use cursed_corridors::jumpscare::JumpscarePhase;
use cursed_corridors::testing::{headless_session, run_for};
use cursed_corridors::timer::TimerEvent;
use cursed_corridors::{GameConfig, Phase};

fn quiet_ghost() -> GameConfig {
    GameConfig {
        ghost_heartbeat_chance: 0.0,
        whisper_chance: 0.0,
        ..GameConfig::default()
    }
}

#[test]
fn start_enters_level_one() {
    let mut s = headless_session(GameConfig::default(), 1);
    s.start();
    let st = s.state();
    assert_eq!(st.level, 1);
    assert_eq!(st.seconds_remaining, 60);
    assert!(!st.has_key);
    assert!(st.running);
    assert_eq!(s.phase(), Phase::LevelActive);
    assert_eq!(s.stage().phases, vec![Phase::Idle, Phase::LevelActive]);
    assert!(s.stage().ghost_visible);
}

#[test]
fn level_five_gets_the_long_clock() {
    let mut s = headless_session(GameConfig::default(), 1);
    s.start();
    for _ in 0..4 {
        s.skip();
    }
    assert_eq!(s.state().level, 5);
    assert_eq!(s.state().seconds_remaining, 120);
    assert_eq!(s.ui_state().timer_label, "02:00");
}

#[test]
fn exit_with_key_advances_a_level() {
    let mut s = headless_session(GameConfig::default(), 3);
    s.start();
    s.skip();
    s.skip();
    assert_eq!(s.state().level, 3);
    run_for(&mut s, 5000.0);

    s.collect_key();
    assert_eq!(s.message(), Some(KEY_PICKED_MESSAGE));
    s.attempt_exit();
    let st = s.state();
    assert_eq!(st.level, 4);
    assert!(!st.has_key);
    assert_eq!(st.seconds_remaining, 60);
    assert!(!s.door_visible());
    assert!(s.stage().key_visible);
}

#[test]
fn exit_on_last_level_wins() {
    let mut s = headless_session(GameConfig::default(), 4);
    s.start();
    for _ in 0..9 {
        s.skip();
    }
    assert_eq!(s.state().level, 10);
    s.collect_key();
    s.attempt_exit();
    assert_eq!(s.phase(), Phase::GameWon);
    assert!(!s.state().running);
    assert_eq!(s.message(), Some(VICTORY_MESSAGE));
    assert!(!s.ambient().music.is_running());
    assert!(!s.ambient().whisper.is_running());
    assert_eq!(s.scheduler().pending_count(TimerEvent::Countdown), 0);
    assert_eq!(s.scheduler().pending_count(TimerEvent::GhostWander), 0);
    assert!(!s.stage().ghost_visible);
}

#[test]
fn sixty_ticks_without_key_fail_level_one() {
    let mut s = headless_session(quiet_ghost(), 5);
    s.start();
    for _ in 0..59 {
        s.tick();
    }
    assert_eq!(s.phase(), Phase::LevelActive);
    assert_eq!(s.state().seconds_remaining, 1);
    s.tick();
    assert_eq!(s.phase(), Phase::LevelFailed);
    assert!(!s.state().running);
    assert!(s.surface().visible);
    assert_eq!(s.audio().bursts(), 1);
    assert_eq!(s.stage().phases.last(), Some(&Phase::LevelFailed));
}

#[test]
fn heartbeat_quickens_in_the_last_ten_seconds() {
    let mut s = headless_session(quiet_ghost(), 6);
    s.start();
    run_for(&mut s, 49_000.0);
    assert_eq!(s.state().seconds_remaining, 11);
    assert_eq!(s.audio().heartbeat_thumps(), 0);

    run_for(&mut s, 1000.0);
    assert_eq!(s.audio().heartbeat_thumps(), 2);
    run_for(&mut s, 10_000.0);
    // s = 10 ..= 0, two thumps each
    assert_eq!(s.audio().heartbeat_thumps(), 22);
    assert_eq!(s.phase(), Phase::LevelFailed);
}

#[test]
fn jumpscare_plays_through_and_hides() {
    let mut s = headless_session(quiet_ghost(), 7);
    s.start();
    run_for(&mut s, 60_000.0);
    assert_eq!(s.phase(), Phase::LevelFailed);
    assert!(matches!(s.jumpscare().phase(), JumpscarePhase::Animating(_)));

    run_for(&mut s, 1600.0);
    assert_eq!(s.jumpscare().phase(), JumpscarePhase::Holding);
    assert!(s.surface().frames() > 60);
    assert!(s.surface().visible);

    run_for(&mut s, 600.0);
    assert_eq!(s.jumpscare().phase(), JumpscarePhase::Hidden);
    assert!(!s.surface().visible);
    assert_eq!(s.scheduler().pending_total(), 0);
    assert_eq!(s.audio().bursts(), 1);
}

#[test]
fn restart_mid_jumpscare_leaves_one_clean_level() {
    let mut s = headless_session(quiet_ghost(), 8);
    s.start();
    run_for(&mut s, 60_000.0);
    run_for(&mut s, 400.0);
    assert!(s.jumpscare().is_active());

    s.restart();
    assert_eq!(s.phase(), Phase::LevelActive);
    assert_eq!(s.state().level, 1);
    assert_eq!(s.state().seconds_remaining, 60);
    assert!(!s.surface().visible);
    assert!(!s.jumpscare().is_active());

    let sched = s.scheduler();
    assert_eq!(sched.pending_count(TimerEvent::Countdown), 1);
    assert_eq!(sched.pending_count(TimerEvent::GhostWander), 1);
    assert_eq!(sched.pending_count(TimerEvent::MusicPhrase), 1);
    assert_eq!(sched.pending_count(TimerEvent::WhisperModulation), 1);
    assert_eq!(sched.pending_count(TimerEvent::AnimationFrame), 0);
    assert_eq!(sched.pending_count(TimerEvent::JumpscareHold), 0);
    assert_eq!(sched.pending_count(TimerEvent::MessageExpiry), 0);

    let frames = s.surface().frames();
    let thumps = s.audio().heartbeat_thumps();
    run_for(&mut s, 10_000.0);
    assert_eq!(s.surface().frames(), frames, "no stray animation frames");
    assert_eq!(s.audio().heartbeat_thumps(), thumps, "no stray heartbeats");
    assert_eq!(s.audio().live_whisper_beds(), 1);
    assert_eq!(s.state().seconds_remaining, 50);
}

#[test]
fn restart_from_victory_starts_over() {
    let mut s = headless_session(GameConfig::default(), 9);
    s.start();
    for _ in 0..10 {
        s.skip();
    }
    assert_eq!(s.phase(), Phase::GameWon);
    s.restart();
    assert_eq!(s.phase(), Phase::LevelActive);
    assert_eq!(s.state().level, 1);
    assert_eq!(s.message(), Some("Level 1: Find the key and reach the exit."));
}

#[test]
fn start_button_after_failure_begins_again() {
    let mut s = headless_session(quiet_ghost(), 10);
    s.start();
    s.skip();
    run_for(&mut s, 60_000.0);
    assert_eq!(s.phase(), Phase::LevelFailed);
    s.start();
    assert_eq!(s.phase(), Phase::LevelActive);
    assert_eq!(s.state().level, 1);
    assert!(!s.jumpscare().is_active());
}

#[test]
fn teardown_cancels_everything() {
    let mut s = headless_session(GameConfig::default(), 11);
    s.start();
    s.attempt_exit();
    run_for(&mut s, 2500.0);
    s.teardown();
    assert_eq!(s.phase(), Phase::Idle);
    assert_eq!(s.scheduler().pending_total(), 0);
    assert_eq!(s.audio().live_whisper_beds(), 0);
    assert!(!s.state().running);
}

#[test]
fn json_config_shortens_the_run() {
    let cfg = GameConfig::from_json(r#"{"level_count": 3, "base_level_secs": 20, "long_levels": [2]}"#)
        .expect("valid config");
    let mut s = headless_session(cfg, 12);
    s.start();
    assert_eq!(s.state().seconds_remaining, 20);
    s.skip();
    assert_eq!(s.state().seconds_remaining, 120);
    assert_eq!(s.ui_state().level_label, "Level 2 / 3");
    s.skip();
    s.skip();
    assert_eq!(s.phase(), Phase::GameWon);
}

fn ghost_sounds(chance: f64) -> GameConfig {
    GameConfig {
        whisper_chance: chance,
        ghost_heartbeat_chance: chance,
        ..GameConfig::default()
    }
}

#[test]
fn ghost_wander_nudges_whisper_and_plays_soft_heartbeat() {
    let mut s = headless_session(ghost_sounds(1.0), 13);
    s.start();
    run_for(&mut s, 1399.0);
    assert_eq!(s.stage().ghost_moves, 0);
    assert_eq!(s.audio().heartbeat_thumps(), 0);
    // 220ms sweep: six steps so far
    assert!((s.ambient().whisper.phase() - 6.0 * 0.12).abs() < 1e-5);

    run_for(&mut s, 1.0);
    assert_eq!(s.stage().ghost_moves, 1);
    let thumps: Vec<_> = s
        .audio()
        .voices()
        .filter(|v| v.tone_frequency().is_some_and(|f| (f - 60.0).abs() < 1e-3))
        .collect();
    assert_eq!(thumps.len(), 2);
    for t in thumps {
        assert!((t.event.envelope.peak() - 0.3).abs() < 1e-6);
    }
    assert!((s.ambient().whisper.phase() - 7.0 * 0.12).abs() < 1e-5);
    assert_eq!(s.audio().live_whisper_beds(), 1);
}

#[test]
fn ghost_wander_stays_silent_when_chances_are_zero() {
    let mut s = headless_session(ghost_sounds(0.0), 14);
    s.start();
    run_for(&mut s, 1400.0 * 5.0);
    assert_eq!(s.stage().ghost_moves, 5);
    assert_eq!(s.audio().heartbeat_thumps(), 0);
    assert_eq!(s.audio().live_whisper_beds(), 1);
}
