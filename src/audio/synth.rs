//! One-shot sounds: music-box notes, heartbeat thumps and the jumpscare burst.
//!
//! The builders (`music_note`, `heartbeat_thump`, `jumpscare_burst`) are pure;
//! [`ToneSynthesizer`] just schedules them on an engine.

use super::{
    AudioEngine, Envelope, EnvelopePoint, Filter, FilterKind, NoiseShape, SoundEvent, Source,
    VoiceId, Waveform,
};

pub const PHRASE_BASE_HZ: f32 = 220.0;
pub const PHRASE_STEPS: [i32; 6] = [0, 3, 7, 10, 7, 3];
pub const PHRASE_LEAD_S: f64 = 0.05;
pub const PHRASE_NOTE_SPACING_S: f64 = 0.5;
/// Callers retrigger the phrase at this period to loop it.
pub const PHRASE_PERIOD_MS: u32 = 3500;

const NOTE_PEAK: f32 = 0.12;
const NOTE_ATTACK_S: f64 = 0.01;
const NOTE_DECAY_END_S: f64 = 0.7;
const NOTE_LIFETIME_S: f64 = 1.0;

const HEARTBEAT_HZ: f32 = 60.0;
const HEARTBEAT_LEAD_S: f64 = 0.01;
const HEARTBEAT_GAP_S: f64 = 0.18;
const HEARTBEAT_ATTACK_S: f64 = 0.01;
const HEARTBEAT_DECAY_END_S: f64 = 0.45;
const HEARTBEAT_LIFETIME_S: f64 = 0.6;
const HEARTBEAT_LOWPASS_HZ: f32 = 300.0;

const BURST_SECONDS: f32 = 0.6;
const BURST_ATTACK_S: f64 = 0.02;
const BURST_DECAY_END_S: f64 = 0.6;
const BURST_HIGHPASS_HZ: f32 = 600.0;
/// Deliberately above unity; the burst is meant to clip.
const BURST_PEAK: f32 = 1.8;

/// "Near zero" target for exponential decays (exponential ramps cannot reach 0).
pub const SILENCE: f32 = 0.0001;

pub fn semitone_freq(base_hz: f32, semitones: i32) -> f32 {
    base_hz * 2f32.powf(semitones as f32 / 12.0)
}

pub fn music_note(base_hz: f32, semitones: i32) -> SoundEvent {
    SoundEvent {
        source: Source::Tone {
            waveform: Waveform::Triangle,
            frequency: semitone_freq(base_hz, semitones),
        },
        filter: None,
        envelope: Envelope {
            initial: 0.0,
            points: vec![
                EnvelopePoint::set(0.0, 0.0),
                EnvelopePoint::linear(NOTE_ATTACK_S, NOTE_PEAK),
                EnvelopePoint::exponential(NOTE_DECAY_END_S, SILENCE),
            ],
        },
        stop_after: Some(NOTE_LIFETIME_S),
    }
}

pub fn heartbeat_thump(intensity: f32) -> SoundEvent {
    SoundEvent {
        source: Source::Tone {
            waveform: Waveform::Sine,
            frequency: HEARTBEAT_HZ,
        },
        filter: Some(Filter {
            kind: FilterKind::LowPass,
            frequency: HEARTBEAT_LOWPASS_HZ,
            q: None,
        }),
        envelope: Envelope {
            initial: 0.0,
            points: vec![
                EnvelopePoint::set(0.0, 0.0),
                EnvelopePoint::linear(HEARTBEAT_ATTACK_S, 0.5 * intensity),
                EnvelopePoint::exponential(HEARTBEAT_DECAY_END_S, SILENCE),
            ],
        },
        stop_after: Some(HEARTBEAT_LIFETIME_S),
    }
}

pub fn jumpscare_burst() -> SoundEvent {
    SoundEvent {
        source: Source::Noise {
            seconds: BURST_SECONDS,
            shape: NoiseShape::LinearTaper,
            looping: false,
        },
        filter: Some(Filter {
            kind: FilterKind::HighPass,
            frequency: BURST_HIGHPASS_HZ,
            q: None,
        }),
        envelope: Envelope {
            initial: 0.0,
            points: vec![
                EnvelopePoint::set(0.0, SILENCE),
                EnvelopePoint::exponential(BURST_ATTACK_S, BURST_PEAK),
                EnvelopePoint::exponential(BURST_DECAY_END_S, SILENCE),
            ],
        },
        stop_after: None,
    }
}

/// Schedules one-shot sounds. Holds no per-call state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToneSynthesizer;

impl ToneSynthesizer {
    pub fn play_music_note<A: AudioEngine + ?Sized>(
        &self,
        audio: &mut A,
        base_hz: f32,
        semitones: i32,
    ) -> Option<VoiceId> {
        let at = audio.current_time();
        audio.schedule(&music_note(base_hz, semitones), at)
    }

    /// Six notes from 220Hz, 0.5s apart, starting 50ms out. Plays once;
    /// looping is the caller's job (see [`PHRASE_PERIOD_MS`]).
    pub fn play_music_phrase<A: AudioEngine + ?Sized>(&self, audio: &mut A) -> Vec<VoiceId> {
        let t0 = audio.current_time() + PHRASE_LEAD_S;
        PHRASE_STEPS
            .iter()
            .enumerate()
            .filter_map(|(i, &step)| {
                let start = t0 + i as f64 * PHRASE_NOTE_SPACING_S;
                audio.schedule(&music_note(PHRASE_BASE_HZ, step), start)
            })
            .collect()
    }

    /// Two 60Hz thumps 180ms apart.
    pub fn play_heartbeat<A: AudioEngine + ?Sized>(&self, audio: &mut A, intensity: f32) -> Vec<VoiceId> {
        let t = audio.current_time() + HEARTBEAT_LEAD_S;
        let thump = heartbeat_thump(intensity);
        (0..2)
            .filter_map(|i| audio.schedule(&thump, t + i as f64 * HEARTBEAT_GAP_S))
            .collect()
    }

    pub fn play_jumpscare_burst<A: AudioEngine + ?Sized>(&self, audio: &mut A) -> Option<VoiceId> {
        let at = audio.current_time();
        audio.schedule(&jumpscare_burst(), at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingAudio;

    #[test]
    fn phrase_intervals_and_timing() {
        let mut audio = RecordingAudio::ready();
        audio.time = 2.0;
        let ids = ToneSynthesizer.play_music_phrase(&mut audio);
        assert_eq!(ids.len(), 6);
        let starts: Vec<f64> = audio.voices().map(|v| v.start).collect();
        for (i, s) in starts.iter().enumerate() {
            assert!((s - (2.05 + 0.5 * i as f64)).abs() < 1e-9);
        }
        let freqs: Vec<f32> = audio
            .voices()
            .map(|v| match v.event.source {
                Source::Tone { frequency, .. } => frequency,
                _ => panic!("phrase notes are tones"),
            })
            .collect();
        assert!((freqs[0] - 220.0).abs() < 1e-3);
        assert!((freqs[1] - 261.6256).abs() < 1e-2);
        assert!((freqs[3] - 391.9954).abs() < 1e-2);
        assert_eq!(freqs[1], freqs[5]);
    }

    #[test]
    fn note_envelope_contract() {
        let ev = music_note(220.0, 0);
        assert!(matches!(ev.source, Source::Tone { waveform: Waveform::Triangle, .. }));
        assert!((ev.envelope.value_at(0.01) - 0.12).abs() < 1e-6);
        assert!(ev.envelope.value_at(0.7) <= 0.0001 + 1e-7);
        assert_eq!(ev.stop_after, Some(1.0));
    }

    #[test]
    fn heartbeat_scales_with_intensity() {
        let mut audio = RecordingAudio::ready();
        let ids = ToneSynthesizer.play_heartbeat(&mut audio, 1.6);
        assert_eq!(ids.len(), 2);
        let v: Vec<_> = audio.voices().collect();
        assert!((v[1].start - v[0].start - 0.18).abs() < 1e-9);
        assert!((v[0].event.envelope.peak() - 0.8).abs() < 1e-6);
        assert_eq!(
            v[0].event.filter,
            Some(Filter { kind: FilterKind::LowPass, frequency: 300.0, q: None })
        );
        assert!(v[0].event.envelope.value_at(0.45) <= 0.0001 + 1e-7);
    }

    #[test]
    fn burst_is_hot_and_short() {
        let ev = jumpscare_burst();
        assert!((ev.envelope.value_at(0.02) - 1.8).abs() < 1e-5);
        assert!(ev.envelope.value_at(0.6) <= 0.0001 + 1e-7);
        assert!(matches!(ev.source, Source::Noise { looping: false, shape: NoiseShape::LinearTaper, .. }));
        assert_eq!(ev.filter.map(|f| f.kind), Some(FilterKind::HighPass));
    }

    #[test]
    fn nothing_schedules_before_resume() {
        let mut audio = RecordingAudio::default();
        assert!(ToneSynthesizer.play_music_phrase(&mut audio).is_empty());
        assert!(ToneSynthesizer.play_jumpscare_burst(&mut audio).is_none());
        assert_eq!(ToneSynthesizer.play_music_note(&mut audio, 220.0, 3), None);
    }
}
