//! Built-in presets: named `PlateParams` snapshots within the documented
//! control ranges.

use crate::params::PlateParams;

/// A named preset.
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub params: PlateParams,
}

/// The built-in preset table. "factory" matches the engine defaults.
pub fn presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "factory",
            description: "Balanced plate, medium pre-delay",
            params: PlateParams::default(),
        },
        Preset {
            name: "tight-room",
            description: "Short dark tail for drums",
            params: PlateParams {
                wet_mix: 30.0,
                decay: 0.2,
                damping_hz: 4_500.0,
                lowpass_hz: 8_000.0,
                mod_rate_hz: 0.1,
                mod_depth: 0.05,
                predelay_ms: 5.0,
            },
        },
        Preset {
            name: "long-plate",
            description: "Slow bright decay, gentle shimmer",
            params: PlateParams {
                wet_mix: 60.0,
                decay: 0.85,
                damping_hz: 12_000.0,
                lowpass_hz: 14_000.0,
                mod_rate_hz: 0.3,
                mod_depth: 0.2,
                predelay_ms: 25.0,
            },
        },
        Preset {
            name: "chorus-wash",
            description: "Heavy modulation, washed-out tail",
            params: PlateParams {
                wet_mix: 80.0,
                decay: 0.7,
                damping_hz: 9_000.0,
                lowpass_hz: 10_000.0,
                mod_rate_hz: 2.0,
                mod_depth: 0.6,
                predelay_ms: 40.0,
            },
        },
    ]
}

/// Look up a preset by name (case-insensitive).
pub fn preset_by_name(name: &str) -> Option<PlateParams> {
    presets()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.params)
}

/// All preset names, for CLI help output.
pub fn preset_names() -> Vec<&'static str> {
    presets().iter().map(|p| p.name).collect()
}
