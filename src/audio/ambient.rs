//! Long-running background layers: the looping music box and the whisper bed.
//!
//! Each loop owns its voices and its [`CancelableTimer`]. `start` always
//! stops the previous instance first, `stop` is idempotent, and the two
//! loops never touch each other's state.

use super::synth::{PHRASE_PERIOD_MS, ToneSynthesizer};
use super::{AudioEngine, Envelope, Filter, FilterKind, NoiseShape, SoundEvent, Source, VoiceId};
use crate::timer::{CancelableTimer, Scheduler, TimerEvent, TimerId};

pub const WHISPER_SECONDS: f32 = 2.0;
pub const WHISPER_DECAY_RATE: f32 = 2.0;
pub const WHISPER_CENTER_HZ: f32 = 800.0;
pub const WHISPER_Q: f32 = 0.8;
pub const WHISPER_MOD_PERIOD_MS: u32 = 220;
pub const WHISPER_PHASE_STEP: f32 = 0.12;
pub const WHISPER_GAIN_RAMP_S: f64 = 0.15;

/// Filter center and gain target for a modulation phase.
pub fn whisper_modulation(phase: f32) -> (f32, f32) {
    let s = phase.sin().abs();
    (500.0 + s * 1400.0, 0.02 + s * 0.06)
}

pub fn whisper_bed() -> SoundEvent {
    SoundEvent {
        source: Source::Noise {
            seconds: WHISPER_SECONDS,
            shape: NoiseShape::ExpDecay { rate: WHISPER_DECAY_RATE },
            looping: true,
        },
        filter: Some(Filter {
            kind: FilterKind::BandPass,
            frequency: WHISPER_CENTER_HZ,
            q: Some(WHISPER_Q),
        }),
        envelope: Envelope::constant(0.0),
        stop_after: None,
    }
}

/// Music-box phrase retriggered every 3.5s.
#[derive(Debug, Default)]
pub struct MusicLoop {
    voices: Vec<VoiceId>,
    retrigger: CancelableTimer,
}

impl MusicLoop {
    pub fn start<A, S>(&mut self, synth: &ToneSynthesizer, audio: &mut A, sched: &mut S)
    where
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.stop(audio, sched);
        self.voices = synth.play_music_phrase(audio);
        self.retrigger.interval(sched, PHRASE_PERIOD_MS, TimerEvent::MusicPhrase);
    }

    /// Cancels the repeat and silences every note, including ones not yet started.
    pub fn stop<A, S>(&mut self, audio: &mut A, sched: &mut S)
    where
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.retrigger.cancel(sched);
        for v in self.voices.drain(..) {
            audio.stop(v);
        }
    }

    /// Returns false if `id` is not this loop's live retrigger.
    pub fn on_retrigger<A: AudioEngine + ?Sized>(
        &mut self,
        id: TimerId,
        synth: &ToneSynthesizer,
        audio: &mut A,
    ) -> bool {
        if !self.retrigger.owns(id) {
            return false;
        }
        for v in self.voices.drain(..) {
            audio.stop(v);
        }
        self.voices = synth.play_music_phrase(audio);
        true
    }

    pub fn is_running(&self) -> bool {
        self.retrigger.is_armed()
    }
}

/// Looping band-passed noise with a slow filter / gain sweep.
#[derive(Debug, Default)]
pub struct WhisperLoop {
    voice: Option<VoiceId>,
    phase: f32,
    modulator: CancelableTimer,
}

impl WhisperLoop {
    pub fn start<A, S>(&mut self, audio: &mut A, sched: &mut S)
    where
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.stop(audio, sched);
        let at = audio.current_time();
        self.voice = audio.schedule(&whisper_bed(), at);
        self.phase = 0.0;
        self.modulator.interval(sched, WHISPER_MOD_PERIOD_MS, TimerEvent::WhisperModulation);
    }

    pub fn stop<A, S>(&mut self, audio: &mut A, sched: &mut S)
    where
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.modulator.cancel(sched);
        if let Some(v) = self.voice.take() {
            audio.stop(v);
        }
    }

    pub fn on_modulate<A: AudioEngine + ?Sized>(&mut self, id: TimerId, audio: &mut A) -> bool {
        if !self.modulator.owns(id) {
            return false;
        }
        self.step(audio);
        true
    }

    /// Presence check: make sure the bed is running, then push the sweep one step.
    pub fn nudge<A, S>(&mut self, audio: &mut A, sched: &mut S)
    where
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        if !self.is_running() {
            self.start(audio, sched);
        }
        self.step(audio);
    }

    fn step<A: AudioEngine + ?Sized>(&mut self, audio: &mut A) {
        self.phase += WHISPER_PHASE_STEP;
        let (center, gain) = whisper_modulation(self.phase);
        if let Some(v) = self.voice {
            audio.set_filter_frequency(v, center);
            let end = audio.current_time() + WHISPER_GAIN_RAMP_S;
            audio.ramp_gain(v, gain, end);
        }
    }

    pub fn is_running(&self) -> bool {
        self.modulator.is_armed()
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

/// Both ambient layers, started and stopped together by the level lifecycle.
#[derive(Debug, Default)]
pub struct AmbientSoundLoop {
    pub music: MusicLoop,
    pub whisper: WhisperLoop,
}

impl AmbientSoundLoop {
    pub fn start<A, S>(&mut self, synth: &ToneSynthesizer, audio: &mut A, sched: &mut S)
    where
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.music.start(synth, audio, sched);
        self.whisper.start(audio, sched);
    }

    pub fn stop<A, S>(&mut self, audio: &mut A, sched: &mut S)
    where
        A: AudioEngine + ?Sized,
        S: Scheduler + ?Sized,
    {
        self.music.stop(audio, sched);
        self.whisper.stop(audio, sched);
    }
}
