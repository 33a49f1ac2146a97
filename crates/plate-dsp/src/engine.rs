//! The plate reverb signal path: pre-delay, input diffusion, modulated
//! feedback tank, and stereo tap synthesis.
//!
//! Topology per sample (mono tank input; stereo is averaged in):
//!
//! ```text
//! in -> predelay -> lpf -> apf1..apf4 -> x1
//! x1 + x3 -> modAPF1 -> delay1 -> lpf -> apf5 -> delay2 -> *G
//!         -> modAPF2 -> delay3 -> lpf -> apf6 -> delay4 -> *G -> x3'
//! ```
//!
//! The tank is one feedback ring closed by the single register `x3`, which
//! carries the loop value into the next sample. Fourteen fixed-offset taps
//! off the four tank delays and two tank allpasses are summed with
//! alternating signs into the left and right wet outputs; the sign pattern
//! is what decorrelates the channels.

use std::fmt;

use crate::allpass::{AllpassDiffuser, ModulatedAllpass};
use crate::delay::SimpleDelay;
use crate::filter::OnePoleLowpass;
use crate::params::{ref_to_ms, PlateParams};

// ---------------------------------------------------------------------------
// Fixed topology constants (sample counts at the 44.1 kHz reference rate)
// ---------------------------------------------------------------------------

/// Input diffusion chain: (allpass g, reference delay).
const DIFFUSERS: [(f64, f64); 4] = [(0.75, 210.0), (0.75, 158.0), (0.625, 561.0), (0.625, 410.0)];

const MOD_APF_G: f64 = 0.7;
const MOD_APF1_REF: f64 = 1343.0;
const MOD_APF2_REF: f64 = 995.0;

const APF5_G: f64 = 0.5;
const APF5_REF: f64 = 3931.0;
const APF6_G: f64 = 0.5;
const APF6_REF: f64 = 2664.0;

/// Nominal lengths of the four tank delays.
const DELAY_REF: [f64; 4] = [6241.0, 6590.0, 4641.0, 5505.0];

/// Output tap offsets per source line. delay3's 5368 tap is longer than
/// its nominal length, so capacities are sized from these too.
const TAPS_DELAY1: [f64; 3] = [394.0, 4401.0, 3124.0];
const TAPS_APF5: [f64; 2] = [2831.0, 496.0];
const TAPS_DELAY2: [f64; 2] = [2954.0, 179.0];
const TAPS_DELAY3: [f64; 3] = [2945.0, 522.0, 5368.0];
const TAPS_APF6: [f64; 2] = [277.0, 1817.0];
const TAPS_DELAY4: [f64; 2] = [1578.0, 3956.0];

/// Upper bound of the pre-delay control.
const PREDELAY_MAX_MS: f64 = 100.0;

fn max_ref(nominal: f64, taps: &[f64]) -> f64 {
    taps.iter().fold(nominal, |m, &t| m.max(t))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Engine configuration errors surfaced by `reset`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResetError {
    /// Sample rate was zero, negative, or not finite.
    InvalidSampleRate(f64),
}

impl fmt::Display for ResetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetError::InvalidSampleRate(sr) => {
                write!(f, "invalid sample rate: {sr} Hz")
            }
        }
    }
}

impl std::error::Error for ResetError {}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateful plate reverb. One instance per audio stream.
///
/// Lifecycle: construct, `reset(sample_rate)`, then per sample
/// `set_parameters` followed by `process` / `process_mono`. `reset` may be
/// called again at any stream boundary (sample-rate change); it reallocates
/// every buffer and zeroes all state.
#[derive(Debug, Clone, Default)]
pub struct PlateReverb {
    predelay: SimpleDelay,
    input_lpf: OnePoleLowpass,
    diffusers: [AllpassDiffuser; 4],
    mod_apf1: ModulatedAllpass,
    mod_apf2: ModulatedAllpass,
    apf5: AllpassDiffuser,
    apf6: AllpassDiffuser,
    delays: [SimpleDelay; 4],
    tank_lpf1: OnePoleLowpass,
    tank_lpf2: OnePoleLowpass,
    /// Global decay gain G, applied after each tank half.
    g: f64,
    /// Wet fraction, 0..1.
    wet: f64,
    /// Loop-closing feedback register: last sample's ring output, summed
    /// with the diffused input at the top of the ring.
    x3: f64,
    ready: bool,
}

impl PlateReverb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate and zero every buffer for `sample_rate` and install the
    /// fixed coefficients. Must be called before the first `process` and
    /// on every sample-rate change; never mid-buffer.
    pub fn reset(&mut self, sample_rate: f64) -> Result<(), ResetError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ResetError::InvalidSampleRate(sample_rate));
        }

        self.predelay.reset(sample_rate, PREDELAY_MAX_MS);
        self.predelay.set_delay_ms(0.0);

        self.input_lpf.reset(sample_rate);
        self.tank_lpf1.reset(sample_rate);
        self.tank_lpf2.reset(sample_rate);

        for (ap, (g, t)) in self.diffusers.iter_mut().zip(DIFFUSERS) {
            ap.reset(sample_rate, ref_to_ms(t));
            ap.set_coefficients(g, ref_to_ms(t));
        }

        self.mod_apf1.reset(sample_rate, ref_to_ms(MOD_APF1_REF));
        self.mod_apf1.set_g(MOD_APF_G);
        self.mod_apf2.reset(sample_rate, ref_to_ms(MOD_APF2_REF));
        self.mod_apf2.set_g(MOD_APF_G);

        self.apf5
            .reset(sample_rate, ref_to_ms(max_ref(APF5_REF, &TAPS_APF5)));
        self.apf5.set_coefficients(APF5_G, ref_to_ms(APF5_REF));
        self.apf6
            .reset(sample_rate, ref_to_ms(max_ref(APF6_REF, &TAPS_APF6)));
        self.apf6.set_coefficients(APF6_G, ref_to_ms(APF6_REF));

        let tank_taps: [&[f64]; 4] = [&TAPS_DELAY1, &TAPS_DELAY2, &TAPS_DELAY3, &TAPS_DELAY4];
        for ((line, nominal), taps) in self.delays.iter_mut().zip(DELAY_REF).zip(tank_taps) {
            line.reset(sample_rate, ref_to_ms(max_ref(nominal, taps)));
            line.set_delay_ms(ref_to_ms(nominal));
        }

        self.x3 = 0.0;
        // Coefficients below are refreshed every sample by set_parameters;
        // start from the factory snapshot so a bare reset is still sane
        self.apply(&PlateParams::default());
        self.ready = true;
        Ok(())
    }

    /// Push one control snapshot into the primitives' coefficients.
    ///
    /// This is the whole control-to-coefficient mapping in one place:
    /// lowpass -> input stage, damping -> both tank low-passes, decay -> G,
    /// mod rate/depth -> both modulated allpasses, pre-delay -> pre-delay
    /// line. Values are clamped to the documented ranges first; the call is
    /// a pure field copy and safe to repeat with identical values.
    pub fn set_parameters(&mut self, params: &PlateParams) {
        self.apply(&params.clamped());
    }

    fn apply(&mut self, p: &PlateParams) {
        self.wet = p.wet_mix / 100.0;
        self.g = p.decay;
        self.input_lpf.set_cutoff(p.lowpass_hz);
        self.tank_lpf1.set_cutoff(p.damping_hz);
        self.tank_lpf2.set_cutoff(p.damping_hz);
        self.mod_apf1.set_depth(p.mod_depth);
        self.mod_apf1.set_rate(p.mod_rate_hz);
        self.mod_apf2.set_depth(p.mod_depth);
        self.mod_apf2.set_rate(p.mod_rate_hz);
        self.predelay.set_delay_ms(p.predelay_ms);
    }

    /// Process one stereo frame. The two inputs are averaged into the
    /// mono tank; the stereo image of the wet signal comes entirely from
    /// the output taps.
    #[inline]
    pub fn process(&mut self, frame: [f64; 2]) -> [f64; 2] {
        assert!(self.ready, "PlateReverb::reset must be called before processing");
        let [l, r] = frame;
        let (wet_l, wet_r) = self.tank((l + r) * 0.5);
        let dry = 1.0 - self.wet;
        [wet_l * self.wet + l * dry, wet_r * self.wet + r * dry]
    }

    /// Process one mono sample; the dry term feeds both output channels.
    #[inline]
    pub fn process_mono(&mut self, x: f64) -> [f64; 2] {
        assert!(self.ready, "PlateReverb::reset must be called before processing");
        let (wet_l, wet_r) = self.tank(x);
        let dry = 1.0 - self.wet;
        [wet_l * self.wet + x * dry, wet_r * self.wet + x * dry]
    }

    /// Advance the tank by one sample and synthesize the wet stereo pair.
    fn tank(&mut self, x: f64) -> (f64, f64) {
        // Input stage
        let pre = self.predelay.process(x);
        let mut d = self.input_lpf.process(pre);
        for ap in self.diffusers.iter_mut() {
            d = ap.process(d);
        }
        let x1 = d;

        // Feedback ring, first half
        let mod1 = self.mod_apf1.process(x1 + self.x3);
        let del1 = self.delays[0].process(mod1);
        let lp2 = self.tank_lpf1.process(del1);
        let ap5 = self.apf5.process(lp2);
        let del2 = self.delays[1].process(ap5);
        let x2 = del2 * self.g;

        // Second half; the result closes the loop one sample later
        let mod2 = self.mod_apf2.process(x2);
        let del3 = self.delays[2].process(mod2);
        let lp3 = self.tank_lpf2.process(del3);
        let ap6 = self.apf6.process(lp3);
        let del4 = self.delays[3].process(ap6);
        self.x3 = del4 * self.g;

        // Stereo tap synthesis
        let a1 = self.delays[0].read_at_ms(ref_to_ms(TAPS_DELAY1[0]));
        let a2 = self.delays[0].read_at_ms(ref_to_ms(TAPS_DELAY1[1]));
        let a3 = self.delays[0].read_at_ms(ref_to_ms(TAPS_DELAY1[2]));
        let b1 = self.apf5.read_at_ms(ref_to_ms(TAPS_APF5[0]));
        let b2 = self.apf5.read_at_ms(ref_to_ms(TAPS_APF5[1]));
        let c1 = self.delays[1].read_at_ms(ref_to_ms(TAPS_DELAY2[0]));
        let c2 = self.delays[1].read_at_ms(ref_to_ms(TAPS_DELAY2[1]));
        let d1 = self.delays[2].read_at_ms(ref_to_ms(TAPS_DELAY3[0]));
        let d2 = self.delays[2].read_at_ms(ref_to_ms(TAPS_DELAY3[1]));
        let d3 = self.delays[2].read_at_ms(ref_to_ms(TAPS_DELAY3[2]));
        let e1 = self.apf6.read_at_ms(ref_to_ms(TAPS_APF6[0]));
        let e2 = self.apf6.read_at_ms(ref_to_ms(TAPS_APF6[1]));
        let f1 = self.delays[3].read_at_ms(ref_to_ms(TAPS_DELAY4[0]));
        let f2 = self.delays[3].read_at_ms(ref_to_ms(TAPS_DELAY4[1]));

        let y_l = a1 + a2 - b1 + c1 - d1 - e1 - f1;
        let y_r = d2 + d3 - e2 + f2 - a3 - b2 - c2;
        (y_l, y_r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{decay_time_60db, rms};

    fn engine(sr: f64) -> PlateReverb {
        let mut e = PlateReverb::new();
        e.reset(sr).unwrap();
        e
    }

    /// Render an impulse through the wet path, returning (left, right).
    fn impulse_response(params: &PlateParams, sr: f64, seconds: f64) -> (Vec<f64>, Vec<f64>) {
        let mut e = engine(sr);
        let n = (sr * seconds) as usize;
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        for i in 0..n {
            e.set_parameters(params);
            let x = if i == 0 { 1.0 } else { 0.0 };
            let [l, r] = e.process_mono(x);
            left.push(l);
            right.push(r);
        }
        (left, right)
    }

    #[test]
    fn reset_rejects_bad_sample_rates() {
        let mut e = PlateReverb::new();
        assert!(matches!(e.reset(0.0), Err(ResetError::InvalidSampleRate(_))));
        assert!(matches!(e.reset(-44_100.0), Err(ResetError::InvalidSampleRate(_))));
        assert!(e.reset(f64::NAN).is_err());
        assert!(e.reset(48_000.0).is_ok());
    }

    #[test]
    #[should_panic(expected = "reset must be called")]
    fn process_before_reset_is_a_contract_violation() {
        let mut e = PlateReverb::new();
        e.process_mono(0.0);
    }

    #[test]
    fn impulse_energy_decays_over_time() {
        let mut params = PlateParams::default();
        params.wet_mix = 100.0;
        let (left, _) = impulse_response(&params, 44_100.0, 4.0);
        // Compare energy in successive 1-second windows past the onset
        let w = 44_100;
        let energies: Vec<f64> = (0..4).map(|i| rms(&left[i * w..(i + 1) * w])).collect();
        assert!(energies[0] > 0.0, "no reverb energy at all");
        for i in 1..energies.len() {
            assert!(
                energies[i] < energies[i - 1],
                "energy not decaying: {energies:?}"
            );
        }
        // Tail must be essentially gone with decay=0.3
        assert!(energies[3] < 1e-4, "tail too hot: {}", energies[3]);
    }

    #[test]
    fn wet_path_is_causal() {
        let mut params = PlateParams::default();
        params.wet_mix = 100.0;
        params.predelay_ms = 15.0;
        let sr = 44_100.0;
        let mut e = engine(sr);
        // Silence in, silence out before the impulse ever arrives
        for _ in 0..1_000 {
            e.set_parameters(&params);
            let [l, r] = e.process_mono(0.0);
            assert_eq!(l, 0.0);
            assert_eq!(r, 0.0);
        }
        // Impulse: nothing can emerge before the 15 ms pre-delay
        let predelay_samples = (0.015 * sr) as usize;
        e.set_parameters(&params);
        let [l, r] = e.process_mono(1.0);
        assert_eq!(l, 0.0);
        assert_eq!(r, 0.0);
        let mut first_nonzero = None;
        for i in 1..(sr as usize) {
            e.set_parameters(&params);
            let [l, r] = e.process_mono(0.0);
            if first_nonzero.is_none() && (l.abs() > 1e-12 || r.abs() > 1e-12) {
                first_nonzero = Some(i);
            }
        }
        let onset = first_nonzero.expect("reverb tail never appeared");
        assert!(
            onset >= predelay_samples,
            "tail appeared at {onset}, before pre-delay {predelay_samples}"
        );
    }

    #[test]
    fn decay_time_survives_sample_rate_change() {
        let mut params = PlateParams::default();
        params.wet_mix = 100.0;
        params.decay = 0.5;
        params.mod_depth = 0.0;
        let (l_44, _) = impulse_response(&params, 44_100.0, 4.0);
        let (l_88, _) = impulse_response(&params, 88_200.0, 4.0);
        let rt_44 = decay_time_60db(&l_44, 44_100.0).expect("44.1k decay");
        let rt_88 = decay_time_60db(&l_88, 88_200.0).expect("88.2k decay");
        let rel = (rt_44 - rt_88).abs() / rt_44;
        assert!(
            rel < 0.2,
            "RT60 drifted across sample rates: {rt_44:.3}s vs {rt_88:.3}s"
        );
    }

    #[test]
    fn dry_passthrough_at_zero_wet() {
        let mut params = PlateParams::default();
        params.wet_mix = 0.0;
        let mut e = engine(44_100.0);
        for i in 0..10_000 {
            e.set_parameters(&params);
            let l_in = (i as f64 * 0.13).sin();
            let r_in = (i as f64 * 0.29).cos();
            let [l, r] = e.process([l_in, r_in]);
            assert_eq!(l, l_in, "left not bit-exact at {i}");
            assert_eq!(r, r_in, "right not bit-exact at {i}");
        }
    }

    #[test]
    fn no_dry_component_at_full_wet() {
        let mut params = PlateParams::default();
        params.wet_mix = 100.0;
        let mut e = engine(44_100.0);
        e.set_parameters(&params);
        // With a 15 ms pre-delay, nothing wet can coincide with the impulse
        let [l, r] = e.process([1.0, 1.0]);
        assert_eq!(l, 0.0);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn repeated_parameter_pushes_are_idempotent() {
        let params = PlateParams::default();
        let mut once = engine(44_100.0);
        let mut every = engine(44_100.0);
        once.set_parameters(&params);
        for i in 0..20_000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let a = once.process_mono(x);
            every.set_parameters(&params);
            every.set_parameters(&params);
            let b = every.process_mono(x);
            assert_eq!(a, b, "outputs diverged at sample {i}");
        }
    }

    #[test]
    fn reset_restores_deterministic_state() {
        let params = PlateParams::default();
        let mut e = engine(44_100.0);
        let render = |e: &mut PlateReverb| -> Vec<[f64; 2]> {
            (0..10_000)
                .map(|i| {
                    e.set_parameters(&params);
                    e.process_mono(if i == 0 { 1.0 } else { 0.0 })
                })
                .collect()
        };
        let first = render(&mut e);
        e.reset(44_100.0).unwrap();
        let second = render(&mut e);
        assert_eq!(first, second);
    }

    #[test]
    fn modulation_depth_reaches_both_tank_allpasses() {
        // The second modulated allpass follows the live controls; a depth
        // change must alter the tail even past the first tank half
        let mut flat = PlateParams::default();
        flat.wet_mix = 100.0;
        flat.mod_depth = 0.0;
        let mut wobbly = flat.clone();
        wobbly.mod_depth = 0.8;
        wobbly.mod_rate_hz = 3.0;
        let (l_flat, _) = impulse_response(&flat, 44_100.0, 1.0);
        let (l_wob, _) = impulse_response(&wobbly, 44_100.0, 1.0);
        let diff: f64 = l_flat
            .iter()
            .zip(&l_wob)
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(diff > 1e-3, "modulation depth had no audible effect");
    }

    #[test]
    fn factory_preset_impulse_scenario() {
        // Spec'd end-to-end check: factory settings, stereo impulse on the
        // left channel only
        let params = PlateParams::default(); // wet 50, decay 0.3, predelay 15
        let sr = 44_100.0;
        let mut e = engine(sr);
        let n = (sr * 2.0) as usize;
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        for i in 0..n {
            e.set_parameters(&params);
            let frame = if i == 0 { [1.0, 0.0] } else { [0.0, 0.0] };
            let [l, r] = e.process(frame);
            left.push(l);
            right.push(r);
        }
        // Sample 0 carries only the dry half of the left impulse
        assert!((left[0] - 0.5).abs() < 1e-12);
        assert_eq!(right[0], 0.0);
        // Then silence until the pre-delay has elapsed
        let predelay_samples = (0.015 * sr) as usize;
        for i in 1..predelay_samples {
            assert_eq!(left[i], 0.0, "early output at {i}");
            assert_eq!(right[i], 0.0, "early output at {i}");
        }
        // A dense tail follows on both channels
        let tail_l = rms(&left[predelay_samples..]);
        let tail_r = rms(&right[predelay_samples..]);
        assert!(tail_l > 1e-6 && tail_r > 1e-6, "no tail: {tail_l}, {tail_r}");
        // The two channels are decorrelated, not copies
        let differing = left[predelay_samples..]
            .iter()
            .zip(&right[predelay_samples..])
            .filter(|(l, r)| (**l - **r).abs() > 1e-15)
            .count();
        assert!(
            differing > (n - predelay_samples) / 2,
            "channels look identical: {differing} differing samples"
        );
        // And it decays
        let early = rms(&left[predelay_samples..sr as usize]);
        let late = rms(&left[(n - sr as usize / 2)..]);
        assert!(late < early, "tail not decaying: {early} vs {late}");
    }

    #[test]
    fn out_of_range_parameters_are_clamped_not_propagated() {
        let mut params = PlateParams::default();
        params.decay = 5.0; // would be divergent if applied raw
        params.wet_mix = 100.0;
        let mut e = engine(44_100.0);
        let mut peak = 0.0f64;
        for i in 0..220_500 {
            e.set_parameters(&params);
            let x = if i == 0 { 1.0 } else { 0.0 };
            let [l, r] = e.process_mono(x);
            peak = peak.max(l.abs()).max(r.abs());
            assert!(l.is_finite() && r.is_finite());
        }
        assert!(peak < 50.0, "ring is diverging, peak={peak}");
    }
}
