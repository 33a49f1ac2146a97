//! Schroeder allpass diffusers, static and LFO-modulated.
//!
//! One stage: `v[n] = x[n] + g·w[n]`, `y[n] = w[n] - g·v[n]` where `w[n]`
//! is the delay-line output. Flat magnitude response for any |g| < 1; the
//! phase smearing is what turns transients into a dense texture.

use crate::delay::DelayLine;
use crate::lfo::Lfo;

/// Hard ceiling on |g|. A coefficient at or above 1 makes the stage
/// divergent, so the setter clamps rather than propagating it.
const G_LIMIT: f64 = 0.999;

/// Maximum modulation excursion in ms. A fixed constant, kept a small
/// fraction of the tank time constants so modulation thickens the tail
/// without audible pitch wobble.
pub const MAX_MOD_MS: f64 = 100.0;

/// First-order allpass with fixed coefficient and delay time.
#[derive(Debug, Clone, Default)]
pub struct AllpassDiffuser {
    line: DelayLine,
    g: f64,
}

impl AllpassDiffuser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, sample_rate: f64, max_delay_ms: f64) {
        self.line.reset(sample_rate, max_delay_ms);
    }

    pub fn set_coefficients(&mut self, g: f64, delay_ms: f64) {
        self.g = g.clamp(-G_LIMIT, G_LIMIT);
        self.line.set_delay_ms(delay_ms);
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let w = self.line.read_nominal();
        let v = x + self.g * w;
        self.line.write(v);
        w - self.g * v
    }

    /// Tap the interior delay line at an arbitrary offset. The tank reads
    /// apf5/apf6 this way when synthesizing the stereo outputs.
    #[inline]
    pub fn read_at_ms(&self, ms: f64) -> f64 {
        self.line.read_at_ms(ms)
    }
}

/// Allpass whose read offset is perturbed every sample by a sine LFO:
/// `offset = nominal + depth · MAX_MOD_MS · lfo`.
///
/// The delay buffer is sized at reset for the full excursion
/// (`nominal + MAX_MOD_MS`), so no modulation setting can underrun it.
#[derive(Debug, Clone, Default)]
pub struct ModulatedAllpass {
    line: DelayLine,
    lfo: Lfo,
    g: f64,
    delay_ms: f64,
    depth: f64,
}

impl ModulatedAllpass {
    pub fn new() -> Self {
        Self::default()
    }

    /// `nominal_ms` is the unmodulated delay time; capacity covers
    /// `nominal_ms + MAX_MOD_MS`.
    pub fn reset(&mut self, sample_rate: f64, nominal_ms: f64) {
        self.line.reset(sample_rate, nominal_ms + MAX_MOD_MS);
        self.line.set_delay_ms(nominal_ms);
        self.delay_ms = nominal_ms;
        self.lfo.reset(sample_rate);
        self.depth = 0.0;
    }

    pub fn set_g(&mut self, g: f64) {
        self.g = g.clamp(-G_LIMIT, G_LIMIT);
    }

    /// Live modulation depth, [0, 1].
    pub fn set_depth(&mut self, depth: f64) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    /// Live modulation rate in Hz.
    pub fn set_rate(&mut self, rate_hz: f64) {
        self.lfo.set_rate(rate_hz);
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let excursion = self.depth * MAX_MOD_MS * self.lfo.tick();
        let w = self.line.read_offset_ms(self.delay_ms + excursion);
        let v = x + self.g * w;
        self.line.write(v);
        w - self.g * v
    }
}
