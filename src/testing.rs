//! Headless backends: a manual clock, and audio / surface / stage fakes that
//! record what they were asked to do. Used by the test suites and for
//! driving a [`GameSession`] without a browser.

use std::collections::BTreeMap;

use crate::audio::{AudioEngine, SoundEvent, Source, VoiceId};
use crate::config::GameConfig;
use crate::game::{GameSession, Phase, Platform, Stage, UiState};
use crate::jumpscare::{DrawSurface, GradientStop, Rgba};
use crate::timer::{Fired, Scheduler, TimerEvent, TimerId};

/// Nominal display refresh used for frame requests.
pub const FRAME_MS: f64 = 16.0;

#[derive(Clone, Copy, Debug)]
struct Pending {
    due: f64,
    period: Option<f64>,
    event: TimerEvent,
}

/// Deterministic scheduler; time only moves when the caller pops due events.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: f64,
    next_id: u32,
    pending: BTreeMap<TimerId, Pending>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, delay: f64, period: Option<f64>, event: TimerEvent) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert(id, Pending { due: self.now + delay, period, event });
        id
    }

    /// Pop the earliest registration due at or before `until`, advancing the clock to it.
    /// Intervals are re-armed one period later.
    pub fn pop_due(&mut self, until: f64) -> Option<Fired> {
        let (&id, &p) = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= until)
            .min_by(|a, b| a.1.due.total_cmp(&b.1.due).then(a.0.cmp(b.0)))?;
        self.now = self.now.max(p.due);
        match p.period {
            Some(period) => {
                if let Some(entry) = self.pending.get_mut(&id) {
                    entry.due += period;
                }
            }
            None => {
                self.pending.remove(&id);
            }
        }
        Some(Fired { id, event: p.event })
    }

    pub fn set_now(&mut self, now: f64) {
        self.now = self.now.max(now);
    }

    pub fn pending_count(&self, event: TimerEvent) -> usize {
        self.pending.values().filter(|p| p.event == event).count()
    }

    pub fn pending_total(&self) -> usize {
        self.pending.len()
    }
}

impl Scheduler for ManualScheduler {
    fn now_ms(&self) -> f64 {
        self.now
    }

    fn set_interval(&mut self, period_ms: u32, event: TimerEvent) -> TimerId {
        let period = period_ms as f64;
        self.register(period, Some(period), event)
    }

    fn set_timeout(&mut self, delay_ms: u32, event: TimerEvent) -> TimerId {
        self.register(delay_ms as f64, None, event)
    }

    fn request_frame(&mut self) -> TimerId {
        self.register(FRAME_MS, None, TimerEvent::AnimationFrame)
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.remove(&id);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedVoice {
    pub id: VoiceId,
    pub event: SoundEvent,
    pub start: f64,
    pub stopped: bool,
    pub filter_hz: Option<f32>,
    pub gain_target: Option<f32>,
}

impl RecordedVoice {
    fn ended_by(&self, t: f64) -> bool {
        if let Some(after) = self.event.stop_after {
            return t >= self.start + after;
        }
        match self.event.source {
            Source::Noise { seconds, looping: false, .. } => t >= self.start + seconds as f64,
            _ => false,
        }
    }

    pub fn tone_frequency(&self) -> Option<f32> {
        match self.event.source {
            Source::Tone { frequency, .. } => Some(frequency),
            Source::Noise { .. } => None,
        }
    }
}

/// Audio engine fake. `time` is the engine clock and only moves when a test sets it.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub ready: bool,
    pub time: f64,
    pub master_gain: Option<f32>,
    pub resume_calls: u32,
    next_id: u32,
    voices: Vec<RecordedVoice>,
}

impl RecordingAudio {
    /// An engine that has already been resumed.
    pub fn ready() -> Self {
        Self { ready: true, ..Self::default() }
    }

    pub fn voices(&self) -> impl Iterator<Item = &RecordedVoice> {
        self.voices.iter()
    }

    pub fn voice(&self, id: VoiceId) -> Option<&RecordedVoice> {
        self.voices.iter().find(|v| v.id == id)
    }

    /// Voices neither stopped nor ended on their own at `time`.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.stopped && !v.ended_by(self.time)).count()
    }

    pub fn count_tones(&self, hz: f32) -> usize {
        self.voices
            .iter()
            .filter(|v| v.tone_frequency().is_some_and(|f| (f - hz).abs() < 1e-3))
            .count()
    }

    /// Scheduled heartbeat thumps (60Hz tones).
    pub fn heartbeat_thumps(&self) -> usize {
        self.count_tones(60.0)
    }

    /// Scheduled non-looping noise bursts.
    pub fn bursts(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| matches!(v.event.source, Source::Noise { looping: false, .. }))
            .count()
    }

    pub fn live_whisper_beds(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| !v.stopped && matches!(v.event.source, Source::Noise { looping: true, .. }))
            .count()
    }

    fn find_mut(&mut self, id: VoiceId) -> Option<&mut RecordedVoice> {
        self.voices.iter_mut().find(|v| v.id == id)
    }
}

impl AudioEngine for RecordingAudio {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn resume(&mut self) {
        self.resume_calls += 1;
        self.ready = true;
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn schedule(&mut self, event: &SoundEvent, start: f64) -> Option<VoiceId> {
        if !self.ready {
            return None;
        }
        self.next_id += 1;
        let id = VoiceId(self.next_id);
        self.voices.push(RecordedVoice {
            id,
            event: event.clone(),
            start,
            stopped: false,
            filter_hz: None,
            gain_target: None,
        });
        Some(id)
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(v) = self.find_mut(voice) {
            v.stopped = true;
        }
    }

    fn set_filter_frequency(&mut self, voice: VoiceId, hz: f32) {
        if let Some(v) = self.find_mut(voice) {
            v.filter_hz = Some(hz);
        }
    }

    fn ramp_gain(&mut self, voice: VoiceId, target: f32, _end_time: f64) {
        if let Some(v) = self.find_mut(voice) {
            v.gain_target = Some(target);
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = Some(gain);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear,
    Gradient(Vec<GradientStop>),
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64, color: Rgba },
    Rect { x: f64, y: f64, w: f64, h: f64, color: Rgba },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub visible: bool,
    pub resizes: u32,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, ..Self::default() }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Number of full repaints (each starts with a clear).
    pub fn frames(&self) -> usize {
        self.ops.iter().filter(|o| matches!(o, DrawOp::Clear)).count()
    }
}

impl DrawSurface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn resize_to_display(&mut self) {
        self.resizes += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn fill_vertical_gradient(&mut self, stops: &[GradientStop]) {
        self.ops.push(DrawOp::Gradient(stops.to_vec()));
    }

    fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, color: Rgba) {
        self.ops.push(DrawOp::Ellipse { cx, cy, rx, ry, color });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        self.ops.push(DrawOp::Rect { x, y, w, h, color });
    }
}

#[derive(Debug)]
pub struct RecordingStage {
    pub room: (f64, f64),
    pub key_pos: Option<(f64, f64)>,
    pub key_visible: bool,
    pub door_visible: bool,
    /// Times the door went from hidden to shown.
    pub door_reveals: u32,
    pub ghost_pos: Option<(f64, f64)>,
    pub ghost_visible: bool,
    pub ghost_moves: u32,
    pub hud: Option<UiState>,
    pub phases: Vec<Phase>,
}

impl Default for RecordingStage {
    fn default() -> Self {
        Self {
            room: (800.0, 600.0),
            key_pos: None,
            key_visible: false,
            door_visible: false,
            door_reveals: 0,
            ghost_pos: None,
            ghost_visible: false,
            ghost_moves: 0,
            hud: None,
            phases: Vec::new(),
        }
    }
}

impl Stage for RecordingStage {
    fn room_size(&self) -> (f64, f64) {
        self.room
    }

    fn place_key(&mut self, x: f64, y: f64) {
        self.key_pos = Some((x, y));
    }

    fn set_key_visible(&mut self, visible: bool) {
        self.key_visible = visible;
    }

    fn set_door_visible(&mut self, visible: bool) {
        if visible && !self.door_visible {
            self.door_reveals += 1;
        }
        self.door_visible = visible;
    }

    fn place_ghost(&mut self, x: f64, y: f64) {
        self.ghost_pos = Some((x, y));
        self.ghost_moves += 1;
    }

    fn set_ghost_visible(&mut self, visible: bool) {
        self.ghost_visible = visible;
    }

    fn on_phase_change(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn render_hud(&mut self, ui: &UiState) {
        self.hud = Some(ui.clone());
    }
}

/// Platform made of the recording fakes above.
#[derive(Debug)]
pub struct Headless;

impl Platform for Headless {
    type Audio = RecordingAudio;
    type Surface = RecordingSurface;
    type Scheduler = ManualScheduler;
    type Stage = RecordingStage;
}

/// A fresh headless session with a fixed rng seed. Audio starts uninitialised,
/// as in the browser before the start gesture.
pub fn headless_session(config: GameConfig, seed: u64) -> GameSession<Headless> {
    GameSession::create(
        config,
        RecordingAudio::default(),
        RecordingSurface::new(1280.0, 720.0),
        ManualScheduler::new(),
        RecordingStage::default(),
        seed,
    )
}

/// Advance the manual clock by `ms`, delivering every due callback in order.
pub fn run_for(session: &mut GameSession<Headless>, ms: f64) {
    let until = session.scheduler().now_ms() + ms;
    while let Some(fired) = session.scheduler_mut().pop_due(until) {
        session.on_timer(fired);
    }
    session.scheduler_mut().set_now(until);
}
