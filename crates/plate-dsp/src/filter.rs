//! One-pole low-pass filter used for input shaping and tank damping.

use std::f64::consts::TAU;

/// `y[n] = (1-a)·x[n] + a·y[n-1]` with `a = exp(-2π·fc/sr)`.
///
/// The coefficient is continuous in the cutoff, so live cutoff changes need
/// no extra smoothing beyond recomputing `a`.
#[derive(Debug, Clone, Default)]
pub struct OnePoleLowpass {
    a: f64,
    y1: f64,
    sample_rate: f64,
}

impl OnePoleLowpass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the state register and store the rate context.
    pub fn reset(&mut self, sample_rate: f64) {
        self.y1 = 0.0;
        self.sample_rate = sample_rate;
        self.a = 0.0;
    }

    /// Recompute the coefficient for a new cutoff.
    pub fn set_cutoff(&mut self, cutoff_hz: f64) {
        self.a = (-TAU * cutoff_hz / self.sample_rate).exp();
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        self.y1 = (1.0 - self.a) * x + self.a * self.y1;
        self.y1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_dc_gain() {
        let mut lp = OnePoleLowpass::new();
        lp.reset(44_100.0);
        lp.set_cutoff(2_000.0);
        let mut y = 0.0;
        for _ in 0..100_000 {
            y = lp.process(1.0);
        }
        assert!((y - 1.0).abs() < 1e-9, "DC gain should settle at 1, got {y}");
    }

    #[test]
    fn attenuates_high_frequencies() {
        let sr = 44_100.0;
        let mut lp = OnePoleLowpass::new();
        lp.reset(sr);
        lp.set_cutoff(2_000.0);
        // Drive with a 15 kHz sine, measure steady-state output amplitude
        let f = 15_000.0;
        let mut peak = 0.0f64;
        for n in 0..44_100 {
            let x = (TAU * f * n as f64 / sr).sin();
            let y = lp.process(x);
            if n > 4_410 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.2, "15 kHz should be well attenuated, peak={peak}");
    }

    #[test]
    fn stable_for_documented_cutoff_range() {
        let mut lp = OnePoleLowpass::new();
        lp.reset(44_100.0);
        for fc in [1_000.0, 2_000.0, 10_000.0, 20_000.0] {
            lp.set_cutoff(fc);
            for _ in 0..1_000 {
                let y = lp.process(1.0);
                assert!(y.is_finite() && y.abs() <= 1.0 + 1e-9);
            }
        }
    }
}
