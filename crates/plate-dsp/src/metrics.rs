//! Level and decay measurements for rendered audio.
//!
//! Used by the CLI report and by the timing tests that check reverberation
//! time stays constant across sample rates.

/// RMS level of a signal.
pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|s| s * s).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// Peak absolute level.
pub fn peak(signal: &[f64]) -> f64 {
    signal.iter().map(|s| s.abs()).fold(0.0, f64::max)
}

/// Schroeder backward-integrated energy decay curve, normalized so the
/// first point is 1.0. Empty or silent input yields an empty curve.
pub fn energy_decay_curve(ir: &[f64]) -> Vec<f64> {
    let mut edc = vec![0.0; ir.len()];
    let mut acc = 0.0;
    for (i, &s) in ir.iter().enumerate().rev() {
        acc += s * s;
        edc[i] = acc;
    }
    if acc <= 0.0 {
        return Vec::new();
    }
    for e in edc.iter_mut() {
        *e /= acc;
    }
    edc
}

/// RT60 estimate from an impulse response.
///
/// Fits the -5..-25 dB span of the decay curve and extrapolates to -60 dB,
/// the standard practice when the recorded tail is shorter than the full
/// decay. Returns `None` when the response never drops 25 dB.
pub fn decay_time_60db(ir: &[f64], sample_rate: f64) -> Option<f64> {
    let edc = energy_decay_curve(ir);
    if edc.is_empty() {
        return None;
    }
    let t5 = edc.iter().position(|&e| 10.0 * e.log10() <= -5.0)?;
    let t25 = edc.iter().position(|&e| 10.0 * e.log10() <= -25.0)?;
    if t25 <= t5 {
        return None;
    }
    let span_secs = (t25 - t5) as f64 / sample_rate;
    Some(span_secs * 3.0)
}
