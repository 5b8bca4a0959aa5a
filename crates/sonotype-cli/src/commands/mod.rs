//! Command implementations.

pub mod analyze;
pub mod colorize;
pub mod music;
pub mod share;
pub mod signal;
pub mod traits;

use colored::Colorize;
use sonotype_backend_audio::analysis::AudioMetrics;

/// Prints the standard metering block for a rendered buffer.
pub(crate) fn print_metrics(metrics: &AudioMetrics) {
    println!(
        "  {} rms={:.4}  peak={:.4}  crest={:.2}  centroid={:.0} Hz",
        "levels:".dimmed(),
        metrics.rms,
        metrics.peak,
        metrics.crest,
        metrics.centroid_hz
    );
}
