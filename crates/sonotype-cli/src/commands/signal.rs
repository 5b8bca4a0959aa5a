//! `signal` command: additive render of the trait profile.

use anyhow::{Context, Result};
use colored::Colorize;

use sonotype_backend_audio::analysis::analyze;
use sonotype_backend_audio::{render_signal, WavResult};
use sonotype_spec::harmonics_from_values;

use crate::input::{require_wav_path, ValueArgs};

/// Renders the additive signal to a WAV file.
pub fn run(
    value_args: &ValueArgs,
    out: &str,
    duration: f64,
    sample_rate: u32,
    seed: u32,
    json: bool,
) -> Result<()> {
    let values = value_args.load()?;
    let harmonics = harmonics_from_values(&values);

    let buffer = render_signal(&harmonics, duration, sample_rate as f64)
        .context("rendering signal")?;
    let wav = WavResult::from_mono(&buffer, sample_rate, seed).context("encoding WAV")?;

    let path = require_wav_path(out)?;
    std::fs::write(path, &wav.wav_data).with_context(|| format!("writing {out}"))?;

    let metrics = analyze(&buffer, sample_rate as f64);
    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!(
            "{} {} ({:.1}s at {} Hz, pcm {})",
            "Wrote".green().bold(),
            out,
            wav.duration_seconds(),
            sample_rate,
            &wav.pcm_hash[..16]
        );
        super::print_metrics(&metrics);
    }
    Ok(())
}
