//! Circular delay line with fractional-sample reads.
//!
//! One physical buffer serves both the line's nominal processing delay and
//! any number of arbitrary-offset tap reads, which is how the tank
//! synthesizes its stereo output from four delay lines.

/// Fixed-capacity circular buffer with a write cursor.
///
/// Allocation happens only in `reset`; the per-sample path is write + read.
/// Read offsets are expressed in (fractional) samples behind the write
/// cursor and use linear interpolation.
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    buf: Vec<f64>,
    write_pos: usize,
    /// Nominal delay in samples (fractional).
    delay_samples: f64,
    sample_rate: f64,
}

impl DelayLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)allocate a zeroed buffer sized for the largest offset this line
    /// will ever be asked for, at the given rate. Must run before any
    /// processing and again on every sample-rate change.
    pub fn reset(&mut self, sample_rate: f64, max_delay_ms: f64) {
        let max_samples = (max_delay_ms / 1000.0 * sample_rate).ceil() as usize;
        // +3: one for the post-write cursor offset, one for the
        // interpolation neighbor, one slack slot
        self.buf = vec![0.0; max_samples + 3];
        self.write_pos = 0;
        self.sample_rate = sample_rate;
    }

    /// Set the nominal delay time. Fractional sample counts are honored by
    /// interpolation in `read_nominal`.
    pub fn set_delay_ms(&mut self, delay_ms: f64) {
        self.delay_samples = self.ms_to_samples(delay_ms);
    }

    #[inline]
    pub fn ms_to_samples(&self, ms: f64) -> f64 {
        ms / 1000.0 * self.sample_rate
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Store one sample at the cursor and advance (wrapping).
    #[inline]
    pub fn write(&mut self, sample: f64) {
        self.buf[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos >= self.buf.len() {
            self.write_pos = 0;
        }
    }

    /// Value written `delay_samples` pushes ago, linearly interpolated.
    /// Valid range is [1, capacity - 2); sizing is checked at reset, so an
    /// out-of-range offset here is a configuration bug.
    #[inline]
    pub fn read_back(&self, delay_samples: f64) -> f64 {
        debug_assert!(
            delay_samples >= 1.0 && delay_samples < (self.buf.len() - 1) as f64,
            "read offset {delay_samples} outside buffer of {}",
            self.buf.len()
        );
        let len = self.buf.len();
        let whole = delay_samples as usize;
        let frac = delay_samples - whole as f64;
        let idx0 = (self.write_pos + len - whole) % len;
        let idx1 = (idx0 + len - 1) % len;
        self.buf[idx0] * (1.0 - frac) + self.buf[idx1] * frac
    }

    /// Read at the nominal delay. Pre-write convention: call before this
    /// sample's `write`, returns the sample written `delay` pushes ago.
    #[inline]
    pub fn read_nominal(&self) -> f64 {
        self.read_back(self.delay_samples)
    }

    /// Read at a perturbed offset (modulated allpass). Same pre-write
    /// convention as `read_nominal`; the offset is clamped to one sample on
    /// the low side so a deep modulation excursion cannot go acausal.
    #[inline]
    pub fn read_offset_ms(&self, offset_ms: f64) -> f64 {
        self.read_back(self.ms_to_samples(offset_ms).max(1.0))
    }

    /// Arbitrary tap read, `ms` behind the most recently written sample.
    /// Post-write convention: call after this sample's `write`; `ms = 0`
    /// returns the sample just written.
    #[inline]
    pub fn read_at_ms(&self, ms: f64) -> f64 {
        self.read_back(self.ms_to_samples(ms) + 1.0)
    }
}

/// Plain delay: write, then read at the nominal time. A 0 ms delay passes
/// the input straight through.
#[derive(Debug, Clone, Default)]
pub struct SimpleDelay {
    line: DelayLine,
}

impl SimpleDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, sample_rate: f64, max_delay_ms: f64) {
        self.line.reset(sample_rate, max_delay_ms);
    }

    pub fn set_delay_ms(&mut self, delay_ms: f64) {
        self.line.set_delay_ms(delay_ms);
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        self.line.write(x);
        self.line.read_back(self.line.delay_samples + 1.0)
    }

    /// Tap read at an arbitrary offset behind the current input.
    #[inline]
    pub fn read_at_ms(&self, ms: f64) -> f64 {
        self.line.read_at_ms(ms)
    }
}
