//! `analyze` command: metrics for an existing WAV file.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use sonotype_backend_audio::analysis::{analyze, compute_spectrogram, AudioMetrics};
use sonotype_backend_audio::wav::{decode_wav, downmix_mono, parse_header};

/// Spectrogram framing used by the analyze report.
const SPEC_WINDOW: usize = 1024;
const SPEC_HOP: usize = 512;
const SPEC_MAX_FRAMES: usize = 120;
const SPEC_BINS: usize = 64;

#[derive(Serialize)]
struct AnalyzeReport {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    duration_seconds: f64,
    metrics: AudioMetrics,
    spectrogram_frames: usize,
}

/// Analyzes a WAV file and prints a report.
pub fn run(input: &str, json: bool) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {input}"))?;
    let header = parse_header(&bytes).with_context(|| format!("parsing {input}"))?;
    let (channels, rate) = decode_wav(&bytes).with_context(|| format!("decoding {input}"))?;
    let mono = downmix_mono(&channels);

    let metrics = analyze(&mono, rate as f64);
    let gram = compute_spectrogram(
        &mono,
        rate as f64,
        SPEC_BINS,
        SPEC_WINDOW,
        SPEC_HOP,
        SPEC_MAX_FRAMES,
    );

    let report = AnalyzeReport {
        channels: header.channels,
        sample_rate: header.sample_rate,
        bits_per_sample: header.bits_per_sample,
        duration_seconds: mono.len() as f64 / rate as f64,
        metrics,
        spectrogram_frames: gram.frames.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {}", "Analyzing".cyan().bold(), input);
        println!(
            "  {} {} ch, {} Hz, {} bit, {:.2}s",
            "format:".dimmed(),
            report.channels,
            report.sample_rate,
            report.bits_per_sample,
            report.duration_seconds
        );
        super::print_metrics(&report.metrics);
        println!(
            "  {} {} frames x {} bins",
            "spectrogram:".dimmed(),
            report.spectrogram_frames,
            SPEC_BINS
        );
    }
    Ok(())
}
