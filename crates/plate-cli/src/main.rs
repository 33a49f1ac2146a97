//! Offline render tool for the plate reverb.
//!
//! Reads a WAV file (or synthesizes a unit impulse when none is given),
//! runs it through the reverb, writes a stereo WAV, and reports output
//! levels plus an RT60 estimate.

use clap::Parser;
use plate_dsp::metrics::{decay_time_60db, peak, rms};
use plate_dsp::presets::{preset_by_name, preset_names};
use plate_dsp::{render_plate, render_plate_stereo, PlateParams};
use std::fs;
use std::process;

#[derive(Parser)]
#[command(name = "plate", about = "Plate reverb renderer")]
struct Cli {
    /// Input WAV file (omit to render a unit impulse)
    input_wav: Option<String>,

    /// Output WAV path
    #[arg(short, long, default_value = "plate_out.wav")]
    output: String,

    /// Built-in preset name
    #[arg(long)]
    preset: Option<String>,

    /// JSON parameter file (sparse keys allowed)
    #[arg(long)]
    params: Option<String>,

    /// Sample rate for the synthesized impulse (ignored with an input file)
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Length in seconds of the synthesized impulse signal
    #[arg(long, default_value_t = 1.0)]
    duration: f64,

    /// Seconds of reverb tail appended past the input
    #[arg(long, default_value_t = 2.0)]
    tail: f64,

    /// List built-in presets and exit
    #[arg(long)]
    list_presets: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.list_presets {
        for name in preset_names() {
            println!("{name}");
        }
        return;
    }

    let params = resolve_params(&cli);

    let (sample_rate, channels, samples) = match &cli.input_wav {
        Some(path) => read_wav(path),
        None => {
            let n = (cli.duration * cli.sample_rate as f64).max(1.0) as usize;
            let mut impulse = vec![0.0; n];
            impulse[0] = 1.0;
            eprintln!(
                "Input: synthesized impulse, {} Hz, {n} samples",
                cli.sample_rate
            );
            (cli.sample_rate, 1, impulse)
        }
    };

    let sr = sample_rate as f64;
    let tail_samples = (cli.tail * sr).max(0.0) as usize;

    let (out_l, out_r) = match channels {
        1 => {
            let interleaved = render_plate(&samples, &params, sr, tail_samples)
                .unwrap_or_else(|e| fail(&format!("render failed: {e}")));
            deinterleave(&interleaved)
        }
        2 => {
            let (left, right) = deinterleave(&samples);
            render_plate_stereo(&left, &right, &params, sr, tail_samples)
                .unwrap_or_else(|e| fail(&format!("render failed: {e}")))
        }
        n => fail(&format!("unsupported channel count: {n}")),
    };

    write_wav(&cli.output, sample_rate, &out_l, &out_r);

    eprintln!(
        "Output: {} ({} samples/ch)  rms L/R {:.4}/{:.4}  peak L/R {:.4}/{:.4}",
        cli.output,
        out_l.len(),
        rms(&out_l),
        rms(&out_r),
        peak(&out_l),
        peak(&out_r),
    );
    if cli.input_wav.is_none() {
        match decay_time_60db(&out_l, sr) {
            Some(rt) => eprintln!("Estimated RT60: {rt:.2} s"),
            None => eprintln!("Estimated RT60: tail too short to measure"),
        }
    }
}

fn resolve_params(cli: &Cli) -> PlateParams {
    match (&cli.preset, &cli.params) {
        (Some(_), Some(_)) => fail("--preset and --params are mutually exclusive"),
        (Some(name), None) => preset_by_name(name).unwrap_or_else(|| {
            fail(&format!(
                "unknown preset '{name}' (available: {})",
                preset_names().join(", ")
            ))
        }),
        (None, Some(path)) => {
            let json = fs::read_to_string(path)
                .unwrap_or_else(|e| fail(&format!("failed to read {path}: {e}")));
            PlateParams::from_json(&json)
                .unwrap_or_else(|e| fail(&format!("bad parameter file {path}: {e}")))
        }
        (None, None) => PlateParams::default(),
    }
}

/// Read a WAV file as f64 samples. Returns (sample_rate, channels, interleaved).
fn read_wav(path: &str) -> (u32, usize, Vec<f64>) {
    let reader =
        hound::WavReader::open(path).unwrap_or_else(|e| fail(&format!("failed to open {path}: {e}")));
    let spec = reader.spec();
    let channels = spec.channels as usize;

    eprintln!(
        "Input: {path}, {} ch, {} Hz, {}-bit, {} samples/ch",
        channels,
        spec.sample_rate,
        spec.bits_per_sample,
        reader.len() as usize / channels
    );

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<Result<_, _>>()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>(),
    }
    .unwrap_or_else(|e| fail(&format!("failed to decode {path}: {e}")));

    (spec.sample_rate, channels, samples)
}

fn write_wav(path: &str, sample_rate: u32, left: &[f64], right: &[f64]) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .unwrap_or_else(|e| fail(&format!("failed to create {path}: {e}")));
    for (l, r) in left.iter().zip(right) {
        let res = writer
            .write_sample(*l as f32)
            .and_then(|_| writer.write_sample(*r as f32));
        if let Err(e) = res {
            fail(&format!("failed to write {path}: {e}"));
        }
    }
    if let Err(e) = writer.finalize() {
        fail(&format!("failed to finalize {path}: {e}"));
    }
}

fn deinterleave(interleaved: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = interleaved.len() / 2;
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    for frame in interleaved.chunks_exact(2) {
        left.push(frame[0]);
        right.push(frame[1]);
    }
    (left, right)
}

fn fail(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}
