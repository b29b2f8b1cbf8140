// Level-machine invariants checked over many seeds and levels.
// Native-friendly: everything runs on the headless platform.

#![cfg(not(target_arch = "wasm32"))]

use cursed_corridors::game::NEED_KEY_MESSAGE;
use cursed_corridors::testing::{headless_session, run_for};
use cursed_corridors::{GameConfig, LevelSpec, Phase};

#[test]
fn only_levels_five_and_ten_are_long() {
    let levels = LevelSpec::standard();
    for n in 1..=10 {
        let long = levels.duration(n) == 120;
        assert_eq!(long, n == 5 || n == 10, "level {n}");
        if !long {
            assert_eq!(levels.duration(n), 60);
        }
    }
}

#[test]
fn door_reveals_once_per_level() {
    let mut s = headless_session(GameConfig::default(), 21);
    s.start();
    for level in 1..=9u32 {
        s.collect_key();
        s.collect_key();
        assert!(s.door_visible());
        assert_eq!(s.stage().door_reveals, level);
        s.attempt_exit();
        assert!(!s.door_visible());
        assert!(!s.stage().door_visible);
    }
}

#[test]
fn exit_without_key_changes_nothing() {
    for seed in 0..10 {
        let mut s = headless_session(GameConfig::default(), seed);
        s.start();
        for _ in 0..(seed as usize % 4) {
            s.skip();
        }
        run_for(&mut s, 1000.0 * (seed as f64 + 1.0));
        let before = *s.state();
        s.attempt_exit();
        assert_eq!(*s.state(), before);
        assert_eq!(s.message(), Some(NEED_KEY_MESSAGE));
        assert!(!s.door_visible());
    }
}

#[test]
fn countdown_fails_exactly_once() {
    let mut s = headless_session(GameConfig::default(), 22);
    s.start();
    for _ in 0..60 {
        s.tick();
    }
    assert_eq!(s.phase(), Phase::LevelFailed);
    let bursts = s.audio().bursts();
    let phases = s.stage().phases.len();
    for _ in 0..30 {
        s.tick();
    }
    assert_eq!(s.phase(), Phase::LevelFailed);
    assert_eq!(s.state().seconds_remaining, 0);
    assert_eq!(s.audio().bursts(), bursts);
    assert_eq!(s.stage().phases.len(), phases);
}

#[test]
fn next_level_resets_key_and_clock() {
    let levels = LevelSpec::standard();
    let mut s = headless_session(GameConfig::default(), 23);
    s.start();
    for n in 1..10u32 {
        run_for(&mut s, 7000.0);
        s.collect_key();
        assert!(s.state().has_key);
        s.attempt_exit();
        assert_eq!(s.state().level, n + 1);
        assert!(!s.state().has_key);
        assert_eq!(s.state().seconds_remaining, levels.duration(n + 1));
    }
}

#[test]
fn restart_from_terminal_phases_returns_to_level_one() {
    let levels = LevelSpec::standard();

    let mut failed = headless_session(GameConfig::default(), 24);
    failed.start();
    failed.skip();
    failed.skip();
    run_for(&mut failed, 60_000.0);
    assert_eq!(failed.phase(), Phase::LevelFailed);

    let mut won = headless_session(GameConfig::default(), 25);
    won.start();
    for _ in 0..10 {
        won.collect_key();
        won.attempt_exit();
    }
    assert_eq!(won.phase(), Phase::GameWon);

    for s in [&mut failed, &mut won] {
        s.restart();
        assert_eq!(s.phase(), Phase::LevelActive);
        assert_eq!(s.state().level, 1);
        assert!(!s.state().has_key);
        assert!(s.state().running);
        assert_eq!(s.state().seconds_remaining, levels.duration(1));
    }
}

#[test]
fn repeated_restarts_never_stack_timers() {
    let mut s = headless_session(GameConfig::default(), 26);
    s.start();
    for i in 0..25 {
        run_for(&mut s, 333.0 * i as f64);
        s.restart();
    }
    assert_eq!(s.scheduler().pending_total(), 4);
    assert_eq!(s.audio().live_whisper_beds(), 1);
}

#[test]
fn mute_survives_level_changes() {
    let mut s = headless_session(GameConfig::default(), 27);
    s.start();
    s.toggle_mute();
    s.skip();
    s.restart();
    assert!(s.state().muted);
    assert_eq!(s.audio().master_gain, Some(0.0));
}
