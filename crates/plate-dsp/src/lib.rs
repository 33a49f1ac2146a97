//! Digital plate reverb engine.
//!
//! A diffusion chain feeding a single modulated feedback tank, with the
//! stereo output synthesized from fixed taps off the tank's delay lines.
//! All time constants are stored as 44.1 kHz reference sample counts and
//! converted to wall-clock milliseconds, so the reverb character is
//! invariant under host sample-rate changes.
//!
//! Per-sample entry points live on [`PlateReverb`]; block-render helpers
//! with host-style parameter smoothing live in [`chain`].

pub mod allpass;
pub mod chain;
pub mod delay;
pub mod engine;
pub mod filter;
pub mod lfo;
pub mod metrics;
pub mod params;
pub mod presets;
pub mod smoothing;

pub use chain::{render_plate, render_plate_stereo, PlateProcessor};
pub use engine::{PlateReverb, ResetError};
pub use params::PlateParams;
