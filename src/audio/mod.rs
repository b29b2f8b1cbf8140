//! Procedural audio: declarative sound descriptors and the engine capability.
//!
//! Every sound the game makes is described as a [`SoundEvent`] (source,
//! optional filter, gain envelope, lifetime) and handed to an
//! [`AudioEngine`] with a start time. The engine owns the output bus; the
//! synthesizer and ambient loops only build descriptors and hold voice ids.
//! Envelope math lives here so it can be checked without a browser.

pub mod ambient;
pub mod noise;
pub mod synth;
pub mod web;

pub use ambient::{AmbientSoundLoop, MusicLoop, WhisperLoop};
pub use noise::NoiseShape;
pub use synth::ToneSynthesizer;

/// Handle to a scheduled voice, issued by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    Tone { waveform: Waveform, frequency: f32 },
    /// Mono noise buffer; the shape is baked into the sample data.
    Noise { seconds: f32, shape: NoiseShape, looping: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Filter {
    pub kind: FilterKind,
    pub frequency: f32,
    pub q: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ramp {
    /// Jump to the value at `at`.
    Set,
    /// Linear from the previous point.
    Linear,
    /// Geometric from the previous point (both ends must be > 0).
    Exponential,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopePoint {
    /// Seconds after the voice start.
    pub at: f64,
    pub value: f32,
    pub ramp: Ramp,
}

impl EnvelopePoint {
    pub const fn set(at: f64, value: f32) -> Self {
        Self { at, value, ramp: Ramp::Set }
    }
    pub const fn linear(at: f64, value: f32) -> Self {
        Self { at, value, ramp: Ramp::Linear }
    }
    pub const fn exponential(at: f64, value: f32) -> Self {
        Self { at, value, ramp: Ramp::Exponential }
    }
}

/// Gain automation, evaluated the way Web Audio evaluates `AudioParam` events.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub initial: f32,
    pub points: Vec<EnvelopePoint>,
}

impl Envelope {
    pub fn constant(value: f32) -> Self {
        Self { initial: value, points: Vec::new() }
    }

    /// Gain at `t` seconds after start.
    pub fn value_at(&self, t: f64) -> f32 {
        if t < 0.0 {
            return self.initial;
        }
        let mut prev_t = 0.0;
        let mut prev_v = self.initial;
        for p in &self.points {
            if t < p.at {
                let frac = ((t - prev_t) / (p.at - prev_t)) as f32;
                return match p.ramp {
                    Ramp::Set => prev_v,
                    Ramp::Linear => prev_v + (p.value - prev_v) * frac,
                    Ramp::Exponential if prev_v > 0.0 && p.value > 0.0 => {
                        prev_v * (p.value / prev_v).powf(frac)
                    }
                    Ramp::Exponential => prev_v,
                };
            }
            prev_t = p.at;
            prev_v = p.value;
        }
        prev_v
    }

    pub fn peak(&self) -> f32 {
        self.points.iter().map(|p| p.value).fold(self.initial, f32::max)
    }

    /// Time of the last automation point.
    pub fn settles_at(&self) -> f64 {
        self.points.last().map(|p| p.at).unwrap_or(0.0)
    }
}

/// One schedulable sound.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundEvent {
    pub source: Source,
    pub filter: Option<Filter>,
    pub envelope: Envelope,
    /// Seconds after start at which the source stops; `None` runs until stopped.
    pub stop_after: Option<f64>,
}

/// Output capability consumed by the synthesizer and ambient loops.
///
/// Implementations must treat stopping an unknown/ended voice as a no-op,
/// and must return `None` from [`schedule`](AudioEngine::schedule) while the
/// engine is not initialised (before the user gesture).
pub trait AudioEngine {
    fn is_ready(&self) -> bool;
    /// Initialise / resume on a user gesture. Failure leaves the engine silent.
    fn resume(&mut self);
    /// Engine clock in seconds.
    fn current_time(&self) -> f64;
    fn schedule(&mut self, event: &SoundEvent, start: f64) -> Option<VoiceId>;
    fn stop(&mut self, voice: VoiceId);
    fn set_filter_frequency(&mut self, voice: VoiceId, hz: f32);
    /// Linear gain ramp ending at `end_time` (engine clock).
    fn ramp_gain(&mut self, voice: VoiceId, target: f32, end_time: f64);
    /// Shared output bus gain. Does not stop or restart any voice.
    fn set_master_gain(&mut self, gain: f32);
}
