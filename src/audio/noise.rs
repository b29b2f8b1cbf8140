//! Noise buffer generation with the amplitude shape baked into the samples.

use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoiseShape {
    /// `1 - i/n`: full scale at the start, silent at the end.
    LinearTaper,
    /// `exp(-i/n * rate)`.
    ExpDecay { rate: f32 },
}

impl NoiseShape {
    /// Amplitude multiplier for sample `i` of `n`.
    pub fn gain(&self, i: usize, n: usize) -> f32 {
        if n == 0 {
            return 0.0;
        }
        let x = i as f32 / n as f32;
        match *self {
            NoiseShape::LinearTaper => 1.0 - x,
            NoiseShape::ExpDecay { rate } => (-x * rate).exp(),
        }
    }
}

pub fn sample_count(seconds: f32, sample_rate: f32) -> usize {
    (seconds * sample_rate).max(0.0) as usize
}

/// Fill `out` with uniform white noise in [-1, 1) shaped by `shape`.
pub fn fill<R: Rng + ?Sized>(out: &mut [f32], shape: NoiseShape, rng: &mut R) {
    let n = out.len();
    for (i, s) in out.iter_mut().enumerate() {
        let white: f32 = rng.r#gen::<f32>() * 2.0 - 1.0;
        *s = white * shape.gain(i, n);
    }
}
