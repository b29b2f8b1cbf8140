//! Procedural glitch-face jumpscare.
//!
//! [`JumpscareRenderer::play`] fires the burst sound once, then samples an
//! [`AnimationState`] on every display refresh for 1.5s, repainting the whole
//! frame each time. After progress reaches 1 the last frame is held for 600ms
//! and the surface is hidden.

pub mod canvas;

use rand::Rng;

use crate::audio::{AudioEngine, ToneSynthesizer};
use crate::timer::{CancelableTimer, Scheduler, TimerEvent, TimerId};

pub const DURATION_MS: f64 = 1500.0;
pub const HOLD_MS: u32 = 600;

const EYE_LAYERS: usize = 6;
const MOUTH_SLICES: usize = 10;
const NOISE_BANDS: usize = 10;
const BAND_PRESENCE: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// CSS `rgba(...)` string for canvas fill styles.
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba,
}

/// Resizable 2D pixel surface.
pub trait DrawSurface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    /// Match the backing store to the displayed size.
    fn resize_to_display(&mut self);
    fn set_visible(&mut self, visible: bool);
    fn clear(&mut self);
    /// Full-surface top-to-bottom gradient.
    fn fill_vertical_gradient(&mut self, stops: &[GradientStop]);
    fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, color: Rgba);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba);
}

/// Fixed-duration animation clock. Progress is a pure function of elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl AnimationState {
    pub fn new(start_ms: f64, duration_ms: f64) -> Self {
        Self { start_ms, duration_ms }
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms >= self.duration_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JumpscarePhase {
    Hidden,
    Animating(AnimationState),
    Holding,
}

#[derive(Debug)]
pub struct JumpscareRenderer {
    phase: JumpscarePhase,
    frame: CancelableTimer,
    hold: CancelableTimer,
}

impl Default for JumpscareRenderer {
    fn default() -> Self {
        Self {
            phase: JumpscarePhase::Hidden,
            frame: CancelableTimer::new(),
            hold: CancelableTimer::new(),
        }
    }
}

impl JumpscareRenderer {
    pub fn phase(&self) -> JumpscarePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, JumpscarePhase::Hidden)
    }

    pub fn play<D, A, S>(&mut self, surface: &mut D, synth: &ToneSynthesizer, audio: &mut A, sched: &mut S)
    where
        D: DrawSurface + ?Sized,
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.cancel(surface, sched);
        surface.set_visible(true);
        synth.play_jumpscare_burst(audio);
        self.phase = JumpscarePhase::Animating(AnimationState::new(sched.now_ms(), DURATION_MS));
        self.frame.frame(sched);
    }

    /// One display-refresh sample. Stale frame ids are ignored.
    pub fn on_frame<D, S, R>(&mut self, id: TimerId, surface: &mut D, sched: &mut S, rng: &mut R) -> bool
    where
        D: DrawSurface + ?Sized,
        S: Scheduler + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.frame.take_fired(id) {
            return false;
        }
        let JumpscarePhase::Animating(anim) = self.phase else {
            return false;
        };
        let now = sched.now_ms();
        paint_glitch_face(surface, anim.progress(now), rng);
        if anim.is_complete(now) {
            self.phase = JumpscarePhase::Holding;
            self.hold.timeout(sched, HOLD_MS, TimerEvent::JumpscareHold);
        } else {
            self.frame.frame(sched);
        }
        true
    }

    pub fn on_hold_expired<D: DrawSurface + ?Sized>(&mut self, id: TimerId, surface: &mut D) -> bool {
        if !self.hold.take_fired(id) {
            return false;
        }
        surface.set_visible(false);
        self.phase = JumpscarePhase::Hidden;
        true
    }

    /// Abort any in-flight animation or hold and hide the surface.
    pub fn cancel<D, S>(&mut self, surface: &mut D, sched: &mut S)
    where
        D: DrawSurface + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.frame.cancel(sched);
        self.hold.cancel(sched);
        if self.is_active() {
            surface.set_visible(false);
        }
        self.phase = JumpscarePhase::Hidden;
    }
}

/// Repaint the whole glitch face for `progress` in [0, 1].
///
/// The oval breathes deterministically; eye, mouth and band noise is random
/// per frame and its amplitude scales with `1 - progress`, so the face
/// resolves as the animation completes.
pub fn paint_glitch_face<D, R>(surface: &mut D, progress: f64, rng: &mut R)
where
    D: DrawSurface + ?Sized,
    R: Rng + ?Sized,
{
    let progress = progress.clamp(0.0, 1.0);
    let blur = 1.0 - progress;
    let (w, h) = (surface.width(), surface.height());

    surface.clear();
    surface.fill_vertical_gradient(&[
        GradientStop { offset: 0.0, color: Rgba::new(40, 0, 0, 0.6) },
        GradientStop { offset: 1.0, color: Rgba::new(0, 0, 0, 0.9) },
    ]);

    let (cx, cy) = (w / 2.0, h / 2.0);
    let face = w.min(h) * 0.4;
    surface.fill_ellipse(
        cx,
        cy,
        face * (0.86 + 0.12 * (progress * 10.0).sin()),
        face * (1.16 - 0.12 * (progress * 6.0).cos()),
        Rgba::new(0xf2, 0xe8, 0xdc, 1.0),
    );

    // eyes: stacked offset layers
    let eye_y = cy - face * 0.12;
    for layer in 0..EYE_LAYERS {
        let dx = (rng.r#gen::<f64>() - 0.5) * 40.0 * blur;
        let dy = (rng.r#gen::<f64>() - 0.5) * 12.0 * blur;
        let alpha = 0.08 + 0.15 * (1.0 - layer as f64 / EYE_LAYERS as f64) + blur * 0.2;
        let ink = Rgba::new(0, 0, 0, alpha);
        for side in [-1.0, 1.0] {
            surface.fill_ellipse(cx + side * face * 0.28 + dx, eye_y + dy, face * 0.12, face * 0.18, ink);
        }
    }

    // mouth: horizontal glitch slices
    let mouth_y = cy + face * 0.28;
    let slice_w = face;
    for i in 0..MOUTH_SLICES {
        let slice_h = 6.0 + rng.r#gen::<f64>() * 26.0 * blur;
        let x_off = -slice_w / 2.0 + rng.r#gen::<f64>() * 80.0 * blur;
        let y = mouth_y + (i as f64 - 5.0) * 2.0 + rng.r#gen::<f64>() * 8.0 * blur;
        let red = (40.0 + rng.r#gen::<f64>() * 80.0) as u8;
        let alpha = 0.5 + rng.r#gen::<f64>() * 0.4;
        surface.fill_rect(cx + x_off - slice_w / 2.0, y, slice_w, slice_h, Rgba::new(red, 0, 0, alpha));
    }

    // static: full-width bands, fresh every frame
    for _ in 0..NOISE_BANDS {
        if !rng.gen_bool(BAND_PRESENCE) {
            continue;
        }
        let y = rng.r#gen::<f64>() * h;
        let band_h = 1.0 + rng.r#gen::<f64>() * 8.0;
        let g = (10.0 + rng.r#gen::<f64>() * 80.0) as u8;
        let b = (10.0 + rng.r#gen::<f64>() * 60.0) as u8;
        let alpha = 0.06 + rng.r#gen::<f64>() * 0.12;
        surface.fill_rect(0.0, y, w, band_h, Rgba::new(255, g, b, alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawOp, ManualScheduler, RecordingAudio, RecordingSurface};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn progress_is_clamped_and_linear() {
        let a = AnimationState::new(1000.0, DURATION_MS);
        assert_eq!(a.progress(500.0), 0.0);
        assert_eq!(a.progress(1750.0), 0.5);
        assert_eq!(a.progress(4000.0), 1.0);
        assert!(!a.is_complete(2499.0));
        assert!(a.is_complete(2500.0));
    }

    #[test]
    fn frame_is_painted_from_scratch() {
        let mut surface = RecordingSurface::new(800.0, 600.0);
        let mut rng = SmallRng::seed_from_u64(3);
        paint_glitch_face(&mut surface, 0.3, &mut rng);
        let ops = surface.ops();
        assert_eq!(ops[0], DrawOp::Clear);
        assert!(matches!(ops[1], DrawOp::Gradient(_)));
        let ellipses = ops.iter().filter(|o| matches!(o, DrawOp::Ellipse { .. })).count();
        // face + 6 layers * 2 eyes
        assert_eq!(ellipses, 13);
        let rects = ops.iter().filter(|o| matches!(o, DrawOp::Rect { .. })).count();
        assert!((10..=20).contains(&rects));
    }

    #[test]
    fn jitter_vanishes_at_full_progress() {
        let mut surface = RecordingSurface::new(800.0, 600.0);
        let mut rng = SmallRng::seed_from_u64(11);
        paint_glitch_face(&mut surface, 1.0, &mut rng);
        let face = 600.0 * 0.4;
        let eye_xs: Vec<f64> = surface
            .ops()
            .iter()
            .skip(3)
            .filter_map(|o| match o {
                DrawOp::Ellipse { cx, cy, .. } => Some((*cx, *cy)),
                _ => None,
            })
            .map(|(cx, cy)| {
                assert!((cy - (300.0 - face * 0.12)).abs() < 1e-9);
                cx
            })
            .collect();
        for (i, x) in eye_xs.iter().enumerate() {
            let side = if i % 2 == 0 { -1.0 } else { 1.0 };
            assert!((x - (400.0 + side * face * 0.28)).abs() < 1e-9);
        }
        let mouth: Vec<(f64, f64)> = surface
            .ops()
            .iter()
            .filter_map(|o| match o {
                DrawOp::Rect { x, h, w, .. } if (*w - face).abs() < 1e-9 => Some((*x, *h)),
                _ => None,
            })
            .collect();
        assert_eq!(mouth.len(), 10);
        for (x, h) in mouth {
            assert!((x - (400.0 - face)).abs() < 1e-9);
            assert_eq!(h, 6.0);
        }
    }

    #[test]
    fn play_runs_for_duration_then_holds_then_hides() {
        let mut surface = RecordingSurface::new(640.0, 480.0);
        let mut audio = RecordingAudio::ready();
        let mut sched = ManualScheduler::new();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut js = JumpscareRenderer::default();

        js.play(&mut surface, &ToneSynthesizer, &mut audio, &mut sched);
        assert!(surface.visible);
        assert_eq!(audio.voices().count(), 1, "burst fires once at start");

        while let Some(f) = sched.pop_due(1600.0) {
            match f.event {
                TimerEvent::AnimationFrame => {
                    js.on_frame(f.id, &mut surface, &mut sched, &mut rng);
                }
                TimerEvent::JumpscareHold => {
                    js.on_hold_expired(f.id, &mut surface);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(js.phase(), JumpscarePhase::Holding);
        assert!(surface.frames() > 60);
        assert_eq!(audio.voices().count(), 1);
        assert!(surface.visible);

        let hold = sched.pop_due(1600.0 + 600.0).expect("hold expiry");
        assert!(js.on_hold_expired(hold.id, &mut surface));
        assert!(!surface.visible);
        assert_eq!(js.phase(), JumpscarePhase::Hidden);
    }

    #[test]
    fn cancel_mid_animation_leaves_nothing_pending() {
        let mut surface = RecordingSurface::new(640.0, 480.0);
        let mut audio = RecordingAudio::ready();
        let mut sched = ManualScheduler::new();
        let mut js = JumpscareRenderer::default();
        js.play(&mut surface, &ToneSynthesizer, &mut audio, &mut sched);
        js.cancel(&mut surface, &mut sched);
        assert_eq!(sched.pending_total(), 0);
        assert!(!surface.visible);
        assert!(!js.is_active());
    }
}
