//! Low-frequency sinusoidal oscillator for allpass delay modulation.

use std::f64::consts::TAU;

/// Sine LFO. Phase lives in [0, 2π) and advances by `2π·rate/sample_rate`
/// per tick.
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    phase: f64,
    incr: f64,
    sample_rate: f64,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the phase and store the rate context.
    pub fn reset(&mut self, sample_rate: f64) {
        self.phase = 0.0;
        self.sample_rate = sample_rate;
        self.incr = 0.0;
    }

    /// Update the oscillation rate. Phase is kept, so live rate changes
    /// don't click.
    pub fn set_rate(&mut self, rate_hz: f64) {
        self.incr = TAU * rate_hz / self.sample_rate;
    }

    /// Current value in [-1, 1], then advance one sample.
    #[inline]
    pub fn tick(&mut self) -> f64 {
        let v = self.phase.sin();
        self.phase += self.incr;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        v
    }
}
