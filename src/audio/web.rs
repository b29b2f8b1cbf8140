//! Web Audio backend.
//!
//! The `AudioContext` is only created on [`AudioEngine::resume`], which the
//! session calls from the start gesture. Until then every `schedule` returns
//! `None` and the game runs silent. Construction failures are logged and
//! leave the engine silent for good; nothing here panics.

use std::collections::HashMap;

use rand::rngs::SmallRng;
use web_sys::{
    AudioContext, AudioContextState, AudioNode, AudioParam, AudioScheduledSourceNode,
    BiquadFilterNode, BiquadFilterType, GainNode, OscillatorType,
};

use super::{AudioEngine, FilterKind, Ramp, SoundEvent, Source, VoiceId, Waveform, noise};
use crate::error::GameError;

struct WebVoice {
    source: AudioScheduledSourceNode,
    gain: GainNode,
    filter: Option<BiquadFilterNode>,
    /// Engine time after which the voice has ended on its own.
    ends_at: Option<f64>,
}

pub struct WebAudioEngine {
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    master_gain: f32,
    failed: bool,
    next_id: u32,
    voices: HashMap<VoiceId, WebVoice>,
    rng: SmallRng,
}

impl WebAudioEngine {
    pub fn new(master_gain: f32, rng: SmallRng) -> Self {
        Self {
            ctx: None,
            master: None,
            master_gain,
            failed: false,
            next_id: 0,
            voices: HashMap::new(),
            rng,
        }
    }

    fn init(&mut self) -> Result<(), GameError> {
        let ctx = AudioContext::new().map_err(|e| GameError::AudioUnavailable(format!("{e:?}")))?;
        let master = ctx.create_gain()?;
        master.gain().set_value(self.master_gain);
        master.connect_with_audio_node(&ctx.destination())?;
        self.ctx = Some(ctx);
        self.master = Some(master);
        Ok(())
    }

    fn build(&mut self, event: &SoundEvent, start: f64) -> Result<WebVoice, GameError> {
        let (Some(ctx), Some(master)) = (&self.ctx, &self.master) else {
            return Err(GameError::AudioUnavailable("not initialised".into()));
        };

        let (source, natural_end): (AudioScheduledSourceNode, Option<f64>) = match event.source {
            Source::Tone { waveform, frequency } => {
                let osc = ctx.create_oscillator()?;
                osc.set_type(match waveform {
                    Waveform::Sine => OscillatorType::Sine,
                    Waveform::Triangle => OscillatorType::Triangle,
                });
                osc.frequency().set_value(frequency);
                (osc.into(), None)
            }
            Source::Noise { seconds, shape, looping } => {
                let rate = ctx.sample_rate();
                let len = noise::sample_count(seconds, rate).max(1);
                let mut data = vec![0.0f32; len];
                noise::fill(&mut data, shape, &mut self.rng);
                let buffer = ctx.create_buffer(1, len as u32, rate)?;
                buffer.copy_to_channel(&mut data, 0)?;
                let src = ctx.create_buffer_source()?;
                src.set_buffer(Some(&buffer));
                src.set_loop(looping);
                let end = (!looping).then(|| start + seconds as f64);
                (src.into(), end)
            }
        };

        let gain = ctx.create_gain()?;
        apply_envelope(&gain.gain(), event, start)?;

        let filter = match event.filter {
            Some(f) => {
                let node = ctx.create_biquad_filter()?;
                node.set_type(match f.kind {
                    FilterKind::LowPass => BiquadFilterType::Lowpass,
                    FilterKind::HighPass => BiquadFilterType::Highpass,
                    FilterKind::BandPass => BiquadFilterType::Bandpass,
                });
                node.frequency().set_value(f.frequency);
                if let Some(q) = f.q {
                    node.q().set_value(q);
                }
                Some(node)
            }
            None => None,
        };

        let head: &AudioNode = &source;
        match &filter {
            Some(node) => {
                head.connect_with_audio_node(node)?;
                node.connect_with_audio_node(&gain)?;
            }
            None => {
                head.connect_with_audio_node(&gain)?;
            }
        }
        gain.connect_with_audio_node(master)?;

        source.start_with_when(start)?;
        let ends_at = match event.stop_after {
            Some(after) => {
                source.stop_with_when(start + after)?;
                Some(start + after)
            }
            None => natural_end,
        };
        Ok(WebVoice { source, gain, filter, ends_at })
    }

    fn prune(&mut self) {
        let now = self.current_time();
        self.voices.retain(|_, v| v.ends_at.is_none_or(|end| end > now));
    }
}

fn apply_envelope(param: &AudioParam, event: &SoundEvent, start: f64) -> Result<(), GameError> {
    param.set_value(event.envelope.initial);
    for p in &event.envelope.points {
        let at = start + p.at;
        match p.ramp {
            Ramp::Set => param.set_value_at_time(p.value, at)?,
            Ramp::Linear => param.linear_ramp_to_value_at_time(p.value, at)?,
            Ramp::Exponential => param.exponential_ramp_to_value_at_time(p.value, at)?,
        };
    }
    Ok(())
}

impl AudioEngine for WebAudioEngine {
    fn is_ready(&self) -> bool {
        self.ctx.is_some()
    }

    fn resume(&mut self) {
        if self.ctx.is_none() && !self.failed {
            if let Err(err) = self.init() {
                log::warn!("audio disabled: {err}");
                self.failed = true;
                return;
            }
            log::info!("audio context created");
        }
        if let Some(ctx) = &self.ctx {
            if ctx.state() == AudioContextState::Suspended {
                if let Err(e) = ctx.resume() {
                    log::warn!("audio resume failed: {e:?}");
                }
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.ctx.as_ref().map(|c| c.current_time()).unwrap_or(0.0)
    }

    fn schedule(&mut self, event: &SoundEvent, start: f64) -> Option<VoiceId> {
        if !self.is_ready() {
            return None;
        }
        self.prune();
        match self.build(event, start) {
            Ok(voice) => {
                self.next_id = self.next_id.wrapping_add(1);
                let id = VoiceId(self.next_id);
                self.voices.insert(id, voice);
                Some(id)
            }
            Err(err) => {
                log::warn!("failed to schedule voice: {err}");
                None
            }
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.remove(&voice) {
            // stop() on an ended source is harmless; errors only mean it never started
            let _ = v.source.stop();
        }
    }

    fn set_filter_frequency(&mut self, voice: VoiceId, hz: f32) {
        if let Some(f) = self.voices.get(&voice).and_then(|v| v.filter.as_ref()) {
            f.frequency().set_value(hz);
        }
    }

    fn ramp_gain(&mut self, voice: VoiceId, target: f32, end_time: f64) {
        if let Some(v) = self.voices.get(&voice) {
            let _ = v.gain.gain().linear_ramp_to_value_at_time(target, end_time);
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
        if let Some(m) = &self.master {
            m.gain().set_value(gain);
        }
    }
}
