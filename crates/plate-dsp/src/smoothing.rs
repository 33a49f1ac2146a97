//! Exponential parameter smoothing.
//!
//! Control changes ramp toward their target over ~100 ms so live tweaks of
//! wet mix, damping, or pre-delay don't zipper. The engine itself consumes
//! one already-smoothed snapshot per sample; this module produces them.

use crate::params::PlateParams;

/// Default ramp time for all controls.
pub const SMOOTHING_MS: f64 = 100.0;

/// One smoothed value with an exponential ramp.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f64,
    target: f64,
    /// Per-sample coefficient: `current += coeff * (target - current)`.
    coeff: f64,
}

impl SmoothedParam {
    /// `ramp_ms` is one time constant (~63% of the way to target).
    pub fn new(initial: f64, ramp_ms: f64, sample_rate: f64) -> Self {
        let samples = (ramp_ms / 1000.0) * sample_rate;
        Self {
            current: initial,
            target: initial,
            coeff: 1.0 - (-1.0_f64 / samples).exp(),
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump straight to a value, e.g. at stream reset or preset load.
    pub fn snap(&mut self, value: f64) {
        self.current = value;
        self.target = value;
    }

    #[inline]
    pub fn next(&mut self) -> f64 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    pub fn is_smoothing(&self) -> bool {
        (self.current - self.target).abs() > 1e-8
    }
}

/// All seven reverb controls under one smoother, emitting a `PlateParams`
/// snapshot per sample.
#[derive(Debug, Clone)]
pub struct SmoothedPlateParams {
    wet_mix: SmoothedParam,
    decay: SmoothedParam,
    damping_hz: SmoothedParam,
    lowpass_hz: SmoothedParam,
    mod_rate_hz: SmoothedParam,
    mod_depth: SmoothedParam,
    predelay_ms: SmoothedParam,
}

impl SmoothedPlateParams {
    pub fn new(initial: &PlateParams, ramp_ms: f64, sample_rate: f64) -> Self {
        let p = initial.clamped();
        Self {
            wet_mix: SmoothedParam::new(p.wet_mix, ramp_ms, sample_rate),
            decay: SmoothedParam::new(p.decay, ramp_ms, sample_rate),
            damping_hz: SmoothedParam::new(p.damping_hz, ramp_ms, sample_rate),
            lowpass_hz: SmoothedParam::new(p.lowpass_hz, ramp_ms, sample_rate),
            mod_rate_hz: SmoothedParam::new(p.mod_rate_hz, ramp_ms, sample_rate),
            mod_depth: SmoothedParam::new(p.mod_depth, ramp_ms, sample_rate),
            predelay_ms: SmoothedParam::new(p.predelay_ms, ramp_ms, sample_rate),
        }
    }

    /// Ramp all controls toward a new snapshot.
    pub fn set_target(&mut self, target: &PlateParams) {
        let p = target.clamped();
        self.wet_mix.set_target(p.wet_mix);
        self.decay.set_target(p.decay);
        self.damping_hz.set_target(p.damping_hz);
        self.lowpass_hz.set_target(p.lowpass_hz);
        self.mod_rate_hz.set_target(p.mod_rate_hz);
        self.mod_depth.set_target(p.mod_depth);
        self.predelay_ms.set_target(p.predelay_ms);
    }

    /// Jump all controls, no ramp.
    pub fn snap(&mut self, value: &PlateParams) {
        let p = value.clamped();
        self.wet_mix.snap(p.wet_mix);
        self.decay.snap(p.decay);
        self.damping_hz.snap(p.damping_hz);
        self.lowpass_hz.snap(p.lowpass_hz);
        self.mod_rate_hz.snap(p.mod_rate_hz);
        self.mod_depth.snap(p.mod_depth);
        self.predelay_ms.snap(p.predelay_ms);
    }

    /// Advance one sample and emit the smoothed snapshot.
    #[inline]
    pub fn next(&mut self) -> PlateParams {
        PlateParams {
            wet_mix: self.wet_mix.next(),
            decay: self.decay.next(),
            damping_hz: self.damping_hz.next(),
            lowpass_hz: self.lowpass_hz.next(),
            mod_rate_hz: self.mod_rate_hz.next(),
            mod_depth: self.mod_depth.next(),
            predelay_ms: self.predelay_ms.next(),
        }
    }
}
