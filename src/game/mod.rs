//! Level / game state machine.
//!
//! `Idle -> LevelActive -> (LevelActive | LevelFailed | GameWon)`, with
//! `restart` leading from anywhere back to level 1. A [`GameSession`] owns
//! the state plus every timer, sound loop and animation the current state
//! needs; each level (re)start tears the previous set down before arming a
//! new one. Invalid transitions are silent no-ops.
//!
//! Side effects go through four capabilities bundled by [`Platform`]: audio
//! ([`AudioEngine`]), the jumpscare surface ([`DrawSurface`]), timers
//! ([`Scheduler`]) and the visible room / HUD ([`Stage`]).

pub mod stage;
pub mod web;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::audio::{AmbientSoundLoop, AudioEngine, ToneSynthesizer};
use crate::config::GameConfig;
use crate::jumpscare::{DrawSurface, JumpscareRenderer};
use crate::timer::{CancelableTimer, Fired, Scheduler, TimerEvent};

pub use stage::Stage;

const COUNTDOWN_MS: u32 = 1000;

pub const KEY_PICKED_MESSAGE: &str = "Key picked! Find the EXIT.";
pub const NEED_KEY_MESSAGE: &str = "You need the key!";
pub const VICTORY_MESSAGE: &str = "You escaped the cursed corridors... for now.";

/// Per-level countdown durations, derived once from the config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSpec {
    durations: Vec<u32>,
}

impl LevelSpec {
    pub fn from_config(cfg: &GameConfig) -> Self {
        let durations = (1..=cfg.level_count.max(1))
            .map(|n| {
                if cfg.long_levels.contains(&n) {
                    cfg.long_level_secs
                } else {
                    cfg.base_level_secs
                }
            })
            .collect();
        Self { durations }
    }

    /// The canonical ten-level table.
    pub fn standard() -> Self {
        Self::from_config(&GameConfig::default())
    }

    pub fn level_count(&self) -> u32 {
        self.durations.len() as u32
    }

    /// Seconds on the clock for `level` (1-based, clamped to the table).
    pub fn duration(&self, level: u32) -> u32 {
        let idx = level.clamp(1, self.level_count()) as usize - 1;
        self.durations[idx]
    }
}

/// `MM:SS`.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    LevelActive,
    LevelFailed,
    GameWon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub level: u32,
    pub seconds_remaining: u32,
    pub has_key: bool,
    /// False exactly while the splash, jumpscare or victory screen is up.
    pub running: bool,
    pub muted: bool,
}

/// What the HUD shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub level_label: String,
    pub timer_label: String,
    pub message: String,
    pub mute_label: String,
    pub phase: Phase,
}

/// Capability set a session runs on.
pub trait Platform {
    type Audio: AudioEngine;
    type Surface: DrawSurface;
    type Scheduler: Scheduler;
    type Stage: Stage;
}

pub struct GameSession<P: Platform> {
    config: GameConfig,
    levels: LevelSpec,
    state: GameState,
    phase: Phase,
    door_visible: bool,
    message: Option<String>,
    message_timer: CancelableTimer,
    countdown: CancelableTimer,
    ghost: CancelableTimer,
    synth: ToneSynthesizer,
    ambient: AmbientSoundLoop,
    jumpscare: JumpscareRenderer,
    audio: P::Audio,
    surface: P::Surface,
    scheduler: P::Scheduler,
    stage: P::Stage,
    rng: SmallRng,
}

impl<P: Platform> GameSession<P> {
    pub fn create(
        config: GameConfig,
        audio: P::Audio,
        surface: P::Surface,
        scheduler: P::Scheduler,
        stage: P::Stage,
        seed: u64,
    ) -> Self {
        let levels = LevelSpec::from_config(&config);
        let state = GameState {
            level: 1,
            seconds_remaining: levels.duration(1),
            has_key: false,
            running: false,
            muted: false,
        };
        let mut session = Self {
            config,
            levels,
            state,
            phase: Phase::Idle,
            door_visible: false,
            message: None,
            message_timer: CancelableTimer::new(),
            countdown: CancelableTimer::new(),
            ghost: CancelableTimer::new(),
            synth: ToneSynthesizer,
            ambient: AmbientSoundLoop::default(),
            jumpscare: JumpscareRenderer::default(),
            audio,
            surface,
            scheduler,
            stage,
            rng: SmallRng::seed_from_u64(seed),
        };
        session.stage.on_phase_change(Phase::Idle);
        session.render_hud();
        session
    }

    // --- transitions ---------------------------------------------------------

    /// Begin a run at level 1. Only valid from `Idle` or a terminal phase.
    /// Also the user gesture that unlocks audio.
    pub fn start(&mut self) {
        if self.phase == Phase::LevelActive {
            return;
        }
        self.audio.resume();
        self.audio.set_master_gain(self.bus_gain());
        self.surface.resize_to_display();
        self.jumpscare.cancel(&mut self.surface, &mut self.scheduler);
        self.start_level(1);
    }

    /// One countdown second. No-op unless a level is running.
    pub fn tick(&mut self) {
        if !self.state.running {
            return;
        }
        let s = self.state.seconds_remaining.saturating_sub(1);
        self.state.seconds_remaining = s;
        log::trace!("tick: {s}s left on level {}", self.state.level);

        let threshold = self.config.heartbeat_threshold_secs;
        if s <= threshold {
            let intensity = 1.0 + (threshold - s) as f32 * self.config.heartbeat_step;
            self.synth.play_heartbeat(&mut self.audio, intensity);
        }
        if s == 0 {
            self.fail_level();
        } else {
            self.render_hud();
        }
    }

    pub fn collect_key(&mut self) {
        if !self.state.running || self.state.has_key {
            return;
        }
        self.state.has_key = true;
        self.stage.set_key_visible(false);
        self.door_visible = true;
        self.stage.set_door_visible(true);
        log::debug!("key collected on level {}", self.state.level);
        let ms = self.config.key_message_ms;
        self.show_message(KEY_PICKED_MESSAGE.to_string(), Some(ms));
    }

    /// Door click. Without the key this only shows a hint.
    pub fn attempt_exit(&mut self) {
        if !self.state.running {
            return;
        }
        if !self.state.has_key {
            let ms = self.config.need_key_message_ms;
            self.show_message(NEED_KEY_MESSAGE.to_string(), Some(ms));
            return;
        }
        self.advance();
    }

    /// A successful exit regardless of the key.
    pub fn skip(&mut self) {
        if !self.state.running {
            return;
        }
        self.advance();
    }

    /// From any phase: drop every timer, sound and animation, then `start()`.
    pub fn restart(&mut self) {
        self.halt();
        self.phase = Phase::Idle;
        self.start();
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.state.muted);
    }

    /// Gates the shared output bus; voices keep running.
    pub fn set_muted(&mut self, muted: bool) {
        self.state.muted = muted;
        self.audio.set_master_gain(self.bus_gain());
        self.render_hud();
    }

    /// End of the session's active life: cancel everything and return to `Idle`.
    pub fn teardown(&mut self) {
        self.halt();
        self.set_phase(Phase::Idle);
        self.render_hud();
    }

    /// Deliver a scheduler callback. Ids no longer owned by a component are dropped.
    pub fn on_timer(&mut self, fired: Fired) {
        match fired.event {
            TimerEvent::Countdown => {
                if self.countdown.owns(fired.id) {
                    self.tick();
                }
            }
            TimerEvent::GhostWander => {
                if self.ghost.owns(fired.id) {
                    self.wander_ghost();
                }
            }
            TimerEvent::MusicPhrase => {
                self.ambient.music.on_retrigger(fired.id, &self.synth, &mut self.audio);
            }
            TimerEvent::WhisperModulation => {
                self.ambient.whisper.on_modulate(fired.id, &mut self.audio);
            }
            TimerEvent::AnimationFrame => {
                self.jumpscare
                    .on_frame(fired.id, &mut self.surface, &mut self.scheduler, &mut self.rng);
            }
            TimerEvent::JumpscareHold => {
                self.jumpscare.on_hold_expired(fired.id, &mut self.surface);
            }
            TimerEvent::MessageExpiry => {
                if self.message_timer.take_fired(fired.id) {
                    self.message = None;
                    self.render_hud();
                }
            }
        }
    }

    /// Window resized: match the jumpscare surface to its displayed size.
    pub fn resize_surface(&mut self) {
        self.surface.resize_to_display();
    }

    // --- internals -------------------------------------------------------------

    fn advance(&mut self) {
        if self.state.level < self.levels.level_count() {
            self.start_level(self.state.level + 1);
        } else {
            self.win();
        }
    }

    fn start_level(&mut self, level: u32) {
        self.clear_level();
        let level = level.clamp(1, self.levels.level_count());
        self.state.level = level;
        self.state.seconds_remaining = self.levels.duration(level);
        self.state.has_key = false;
        self.state.running = true;
        self.set_phase(Phase::LevelActive);

        self.place_key();
        self.door_visible = false;
        self.stage.set_door_visible(false);

        self.ambient.start(&self.synth, &mut self.audio, &mut self.scheduler);
        self.stage.set_ghost_visible(true);
        self.ghost
            .interval(&mut self.scheduler, self.config.ghost_interval_ms, TimerEvent::GhostWander);
        self.countdown.interval(&mut self.scheduler, COUNTDOWN_MS, TimerEvent::Countdown);

        log::info!(
            "level {level}/{} started ({}s)",
            self.levels.level_count(),
            self.state.seconds_remaining
        );
        self.show_message(format!("Level {level}: Find the key and reach the exit."), None);
    }

    /// Cancel the per-level timers and ambient audio. Idempotent.
    fn clear_level(&mut self) {
        self.countdown.cancel(&mut self.scheduler);
        self.ghost.cancel(&mut self.scheduler);
        self.ambient.stop(&mut self.audio, &mut self.scheduler);
        self.stage.set_ghost_visible(false);
    }

    fn halt(&mut self) {
        self.state.running = false;
        self.clear_level();
        self.jumpscare.cancel(&mut self.surface, &mut self.scheduler);
        self.message_timer.cancel(&mut self.scheduler);
        self.message = None;
    }

    fn fail_level(&mut self) {
        self.state.running = false;
        self.clear_level();
        self.set_phase(Phase::LevelFailed);
        log::info!("level {} failed: time up", self.state.level);
        self.jumpscare
            .play(&mut self.surface, &self.synth, &mut self.audio, &mut self.scheduler);
        self.render_hud();
    }

    fn win(&mut self) {
        self.state.running = false;
        self.clear_level();
        self.set_phase(Phase::GameWon);
        log::info!("all {} levels cleared", self.levels.level_count());
        self.show_message(VICTORY_MESSAGE.to_string(), None);
    }

    fn place_key(&mut self) {
        let (w, h) = self.stage.room_size();
        let pad = self.config.key_margin_px;
        let x = pad.max(self.rng.r#gen::<f64>() * (w - pad * 2.0));
        let y = pad.max(self.rng.r#gen::<f64>() * (h - pad * 2.0));
        self.stage.place_key(x, y);
        self.stage.set_key_visible(true);
    }

    fn wander_ghost(&mut self) {
        let (w, h) = self.stage.room_size();
        let margin = self.config.ghost_margin_px;
        let x = self.rng.r#gen::<f64>() * (w - margin).max(0.0);
        let y = self.rng.r#gen::<f64>() * (h - margin).max(0.0);
        self.stage.place_ghost(x, y);

        if self.rng.gen_bool(self.config.whisper_chance.clamp(0.0, 1.0)) {
            self.ambient.whisper.nudge(&mut self.audio, &mut self.scheduler);
        }
        if self.rng.gen_bool(self.config.ghost_heartbeat_chance.clamp(0.0, 1.0)) {
            let intensity = self.config.ghost_heartbeat_intensity;
            self.synth.play_heartbeat(&mut self.audio, intensity);
        }
    }

    /// `None` keeps the message until something replaces it.
    fn show_message(&mut self, text: String, expiry_ms: Option<u32>) {
        self.message = Some(text);
        match expiry_ms {
            Some(ms) => self.message_timer.timeout(&mut self.scheduler, ms, TimerEvent::MessageExpiry),
            None => self.message_timer.cancel(&mut self.scheduler),
        }
        self.render_hud();
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.stage.on_phase_change(phase);
        }
    }

    fn bus_gain(&self) -> f32 {
        if self.state.muted { 0.0 } else { self.config.master_gain }
    }

    fn render_hud(&mut self) {
        let ui = self.ui_state();
        self.stage.render_hud(&ui);
    }

    // --- queries -----------------------------------------------------------------

    pub fn ui_state(&self) -> UiState {
        UiState {
            level_label: format!("Level {} / {}", self.state.level, self.levels.level_count()),
            timer_label: format_time(self.state.seconds_remaining),
            message: self.message.clone().unwrap_or_default(),
            mute_label: if self.state.muted { "🔇 Muted" } else { "🔊 Mute" }.to_string(),
            phase: self.phase,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn door_visible(&self) -> bool {
        self.door_visible
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn levels(&self) -> &LevelSpec {
        &self.levels
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn ambient(&self) -> &AmbientSoundLoop {
        &self.ambient
    }

    pub fn jumpscare(&self) -> &JumpscareRenderer {
        &self.jumpscare
    }

    pub fn audio(&self) -> &P::Audio {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut P::Audio {
        &mut self.audio
    }

    pub fn surface(&self) -> &P::Surface {
        &self.surface
    }

    pub fn scheduler(&self) -> &P::Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut P::Scheduler {
        &mut self.scheduler
    }

    pub fn stage(&self) -> &P::Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut P::Stage {
        &mut self.stage
    }
}
