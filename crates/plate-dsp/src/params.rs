//! Parameter schema for the plate reverb.
//!
//! All callers (CLI, tests, host wrappers) use the same `PlateParams` struct.
//! Values are the raw host controls; `clamp()` enforces the documented
//! ranges so an unstable configuration can never reach the tank.

use serde::{Deserialize, Serialize};

/// Reference sample rate. Every fixed time constant in the engine is stored
/// as a sample count at this rate and converted to milliseconds, so delay
/// *times* stay constant in wall-clock terms across host sample rates.
pub const REF_SR: f64 = 44100.0;

/// Convert a 44.1 kHz reference sample count to milliseconds.
#[inline]
pub fn ref_to_ms(ref_samples: f64) -> f64 {
    ref_samples / (REF_SR / 1000.0)
}

/// The seven public reverb controls.
///
/// Uses `#[serde(default)]` so sparse preset JSON loads correctly —
/// missing keys get the factory-preset values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateParams {
    /// Wet/dry mix in percent, 0–100.
    pub wet_mix: f64,
    /// Per-stage tank loss, 0–0.9. Governs reverberation time.
    pub decay: f64,
    /// Tank high-frequency damping cutoff in Hz, 2000–20000.
    pub damping_hz: f64,
    /// Input-stage low-pass cutoff in Hz, 1000–20000.
    pub lowpass_hz: f64,
    /// Allpass modulation rate in Hz, 0.1–100.
    pub mod_rate_hz: f64,
    /// Allpass modulation depth, 0–1.
    pub mod_depth: f64,
    /// Pre-delay before diffusion in ms, 0–100.
    pub predelay_ms: f64,
}

impl Default for PlateParams {
    fn default() -> Self {
        Self {
            wet_mix: 50.0,
            decay: 0.3,
            damping_hz: 10_000.0,
            lowpass_hz: 10_000.0,
            mod_rate_hz: 0.1,
            mod_depth: 0.1,
            predelay_ms: 15.0,
        }
    }
}

impl PlateParams {
    /// Parse from JSON. Missing fields get factory-preset values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Clamp every control to its documented range.
    ///
    /// This is the stability boundary: decay stays strictly below 1 so the
    /// feedback ring always loses energy, and cutoffs stay away from 0 Hz.
    pub fn clamp(&mut self) {
        self.wet_mix = self.wet_mix.clamp(0.0, 100.0);
        self.decay = self.decay.clamp(0.0, 0.9);
        self.damping_hz = self.damping_hz.clamp(2_000.0, 20_000.0);
        self.lowpass_hz = self.lowpass_hz.clamp(1_000.0, 20_000.0);
        self.mod_rate_hz = self.mod_rate_hz.clamp(0.1, 100.0);
        self.mod_depth = self.mod_depth.clamp(0.0, 1.0);
        self.predelay_ms = self.predelay_ms.clamp(0.0, 100.0);
    }

    /// Clamped copy.
    pub fn clamped(&self) -> Self {
        let mut p = self.clone();
        p.clamp();
        p
    }
}
