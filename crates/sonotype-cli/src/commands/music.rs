//! `music` command: procedural composition from the trait profile.

use anyhow::{Context, Result};
use colored::Colorize;

use sonotype_backend_audio::analysis::analyze;
use sonotype_backend_audio::WavResult;
use sonotype_backend_music::{render_music, MusicParams};
use sonotype_spec::{harmonics_from_values, score_map};

use crate::input::{require_wav_path, ValueArgs};

/// Composes and renders the piece to a stereo WAV file.
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
    let params = MusicParams::from_scores(&score_map(&harmonics));

    let stereo = render_music(&harmonics, duration, sample_rate as f64, seed)
        .context("rendering music")?;
    let wav = WavResult::from_stereo(&stereo, sample_rate, seed).context("encoding WAV")?;

    let path = require_wav_path(out)?;
    std::fs::write(path, &wav.wav_data).with_context(|| format!("writing {out}"))?;

    // Meters read the left channel, like the strip in the UI does.
    let metrics = analyze(&stereo.left, sample_rate as f64);
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
        println!(
            "  {} {} BPM, swing {:.2}, width {:.2}, shape {:?}, {}",
            "feel:".dimmed(),
            params.tempo_bpm,
            params.swing,
            params.stereo_width,
            params.shape,
            if params.merry_scale {
                "major pentatonic"
            } else {
                "natural minor"
            }
        );
        super::print_metrics(&metrics);
    }
    Ok(())
}
