//! Note tables and pitch quantization.

/// C major pentatonic flavor across two octaves, C3 to C5.
pub const MAJOR_PENTATONIC: &[i32] = &[48, 50, 52, 55, 57, 60, 62, 64, 67, 69, 72];

/// Default table: two octaves of A natural minor.
pub const DEFAULT_SCALE: &[i32] = &[45, 47, 48, 50, 52, 53, 55, 57, 59, 60, 62, 64];

/// Converts a MIDI note number to Hz (A4 = 69 = 440 Hz).
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

/// Snaps a frequency to the nearest note of a scale, returned in Hz.
///
/// Non-positive or non-finite input snaps to the scale's lowest note.
pub fn quantize_to_scale(freq: f64, scale: &[i32]) -> f64 {
    debug_assert!(!scale.is_empty());
    if !freq.is_finite() || freq <= 0.0 {
        return midi_to_hz(scale[0] as f64);
    }
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    let mut best = scale[0];
    let mut best_diff = f64::INFINITY;
    for &note in scale {
        let diff = (note as f64 - midi).abs();
        if diff < best_diff {
            best_diff = diff;
            best = note;
        }
    }
    midi_to_hz(best as f64)
}
