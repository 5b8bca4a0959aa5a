//! `colorize` command: apply the trait profile to user audio.

use anyhow::{Context, Result};
use colored::Colorize;

use sonotype_backend_audio::wav::{decode_wav, downmix_mono, resample_nearest};
use sonotype_backend_audio::{colorize, WavResult};
use sonotype_spec::harmonics_from_values;

use crate::input::{require_wav_path, ValueArgs};

/// Decodes a WAV file, conforms it to the working rate, colorizes it
/// and writes the stereo result.
pub fn run(
    value_args: &ValueArgs,
    input: &str,
    out: &str,
    sample_rate: u32,
    seed: u32,
) -> Result<()> {
    let values = value_args.load()?;
    let harmonics = harmonics_from_values(&values);

    let bytes = std::fs::read(input).with_context(|| format!("reading {input}"))?;
    let (channels, src_rate) =
        decode_wav(&bytes).with_context(|| format!("decoding {input}"))?;
    let mono = downmix_mono(&channels);
    let conformed =
        resample_nearest(&mono, src_rate, sample_rate).context("resampling input")?;

    let stereo = colorize(&conformed, sample_rate as f64, &harmonics)
        .context("colorizing audio")?;
    let wav = WavResult::from_stereo(&stereo, sample_rate, seed).context("encoding WAV")?;

    let path = require_wav_path(out)?;
    std::fs::write(path, &wav.wav_data).with_context(|| format!("writing {out}"))?;

    println!(
        "{} {} ({:.1}s, {} Hz -> {} Hz, pcm {})",
        "Wrote".green().bold(),
        out,
        wav.duration_seconds(),
        src_rate,
        sample_rate,
        &wav.pcm_hash[..16]
    );
    Ok(())
}
