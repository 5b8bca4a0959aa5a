//! Spectral and level analysis.
//!
//! The spectrum path is a windowed direct DFT, not an FFT. At the window
//! sizes used here (<= 1024) the O(N^2) cost is irrelevant, and the
//! straight-line arithmetic is bit-for-bit reproducible across runs,
//! which the metering contract requires. The rustfft dev-dependency
//! exists only to cross-check the magnitudes in tests.

use serde::Serialize;

/// RMS, absolute peak and crest factor of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelMetrics {
    /// Root mean square level.
    pub rms: f64,
    /// Absolute peak level.
    pub peak: f64,
    /// Peak over RMS; 0 when the buffer is silent.
    pub crest: f64,
}

/// Computes RMS, peak and crest factor.
pub fn compute_rms_peak(samples: &[f64]) -> LevelMetrics {
    let mut sum_sq = 0.0;
    let mut peak = 0.0_f64;
    for &s in samples {
        sum_sq += s * s;
        peak = peak.max(s.abs());
    }
    let rms = (sum_sq / samples.len().max(1) as f64).sqrt();
    let crest = if rms > 0.0 { peak / rms } else { 0.0 };
    LevelMetrics { rms, peak, crest }
}

/// Magnitude spectrum of one analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// N/2 magnitude bins, normalized to [0, 1] by the peak bin.
    pub mags: Vec<f64>,
    /// Amplitude-weighted spectral centroid in Hz, DC excluded.
    pub centroid_hz: f64,
}

/// Hann window coefficient for index `n` of an `len`-point window.
fn hann(n: usize, len: usize) -> f64 {
    if len < 2 {
        return 1.0;
    }
    0.5 * (1.0 - (std::f64::consts::TAU * n as f64 / (len - 1) as f64).cos())
}

/// Direct DFT magnitudes of a windowed slice, N/2 bins.
fn dft_magnitudes(slice: &[f64], window: &[f64]) -> Vec<f64> {
    let n = slice.len();
    let half = n / 2;
    let mut mags = Vec::with_capacity(half);
    for k in 0..half {
        let mut sum_re = 0.0;
        let mut sum_im = 0.0;
        for (i, (&x, &w)) in slice.iter().zip(window.iter()).enumerate() {
            let ph = -std::f64::consts::TAU * k as f64 * i as f64 / n as f64;
            let xw = x * w;
            sum_re += xw * ph.cos();
            sum_im += xw * ph.sin();
        }
        mags.push((sum_re * sum_re + sum_im * sum_im).sqrt());
    }
    mags
}

fn normalize_by_peak(mags: &mut [f64]) {
    let peak = mags.iter().fold(0.0_f64, |p, &m| p.max(m));
    if peak > 0.0 {
        for m in mags.iter_mut() {
            *m /= peak;
        }
    }
}

/// Computes a Hann-windowed magnitude spectrum and centroid.
///
/// The window is centered on the buffer; buffers shorter than
/// `window_size` use their full length. Bin `k` covers
/// `k * sample_rate / N` Hz. The centroid excludes bin 0 so a DC offset
/// cannot drag it toward zero.
pub fn compute_spectrum(samples: &[f64], sample_rate: f64, window_size: usize) -> Spectrum {
    let n = window_size.min(samples.len());
    if n < 2 {
        return Spectrum {
            mags: Vec::new(),
            centroid_hz: 0.0,
        };
    }
    let start = (samples.len() - n) / 2;
    let window: Vec<f64> = (0..n).map(|i| hann(i, n)).collect();
    let mut mags = dft_magnitudes(&samples[start..start + n], &window);
    normalize_by_peak(&mut mags);

    let mut num = 0.0;
    let mut den = 0.0;
    for (k, &m) in mags.iter().enumerate().skip(1) {
        let f = k as f64 * sample_rate / n as f64;
        num += f * m;
        den += m;
    }
    let centroid_hz = if den > 0.0 { num / den } else { 0.0 };

    Spectrum { mags, centroid_hz }
}

/// Downsamples a magnitude spectrum into `bins` buckets, keeping the
/// loudest bin in each bucket.
pub fn bin_spectrum(mags: &[f64], bins: usize) -> Vec<f64> {
    let mut out = vec![0.0; bins];
    if mags.is_empty() || bins == 0 {
        return out;
    }
    for (i, slot) in out.iter_mut().enumerate() {
        let a = i * mags.len() / bins;
        let b = ((i + 1) * mags.len() / bins).max(a + 1).min(mags.len());
        *slot = mags[a..b].iter().fold(0.0_f64, |p, &m| p.max(m));
    }
    out
}

/// A bounded, time-ordered sequence of binned spectrum frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// One binned magnitude frame per analysis position.
    pub frames: Vec<Vec<f64>>,
    /// Sample rate the frames were computed at.
    pub sample_rate: f64,
    /// Buckets per frame.
    pub bins: usize,
}

/// Computes a budgeted spectrogram.
///
/// Frames are Hann + DFT windows binned with [`bin_spectrum`], advanced
/// by `hop_size` times a stride chosen so at most `max_frames` frames
/// cover the whole buffer: the stride is `ceil(total / max_frames)`, so
/// long buffers get coarser framing rather than a truncated tail.
pub fn compute_spectrogram(
    samples: &[f64],
    sample_rate: f64,
    bins: usize,
    window_size: usize,
    hop_size: usize,
    max_frames: usize,
) -> Spectrogram {
    let mut frames = Vec::new();
    let n = window_size.max(2);
    let hop = hop_size.max(1);

    if samples.len() >= n && max_frames > 0 {
        let window: Vec<f64> = (0..n).map(|i| hann(i, n)).collect();
        let total = (samples.len() - n) / hop + 1;
        let stride = total.div_ceil(max_frames).max(1);

        let mut idx = 0;
        while idx + n <= samples.len() && frames.len() < max_frames {
            let mut mags = dft_magnitudes(&samples[idx..idx + n], &window);
            normalize_by_peak(&mut mags);
            frames.push(bin_spectrum(&mags, bins));
            idx += hop * stride;
        }
    }

    Spectrogram {
        frames,
        sample_rate,
        bins,
    }
}

/// Everything the meters show, in one serializable bundle.
#[derive(Debug, Clone, Serialize)]
pub struct AudioMetrics {
    /// Root mean square level.
    pub rms: f64,
    /// Absolute peak level.
    pub peak: f64,
    /// Crest factor.
    pub crest: f64,
    /// Spectral centroid in Hz.
    pub centroid_hz: f64,
    /// 64-bucket magnitude spectrum.
    pub spectrum: Vec<f64>,
}

/// Analysis window used by [`analyze`].
pub const ANALYSIS_WINDOW: usize = 512;

/// Spectrum buckets used by [`analyze`] and the spectrogram strip.
pub const ANALYSIS_BINS: usize = 64;

/// Computes the standard metering bundle for a finished buffer.
pub fn analyze(samples: &[f64], sample_rate: f64) -> AudioMetrics {
    let levels = compute_rms_peak(samples);
    let spectrum = compute_spectrum(samples, sample_rate, ANALYSIS_WINDOW);
    AudioMetrics {
        rms: levels.rms,
        peak: levels.peak,
        crest: levels.crest,
        centroid_hz: spectrum.centroid_hz,
        spectrum: bin_spectrum(&spectrum.mags, ANALYSIS_BINS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oscillator::TWO_PI;

    fn sine(freq: f64, sample_rate: f64, len: usize, amp: f64) -> Vec<f64> {
        (0..len)
            .map(|i| amp * (TWO_PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_levels_of_silence() {
        let m = compute_rms_peak(&vec![0.0; 4096]);
        assert_eq!(m.rms, 0.0);
        assert_eq!(m.peak, 0.0);
        assert_eq!(m.crest, 0.0);
    }

    #[test]
    fn test_levels_of_pure_sine() {
        let amp = 0.6;
        // Whole number of periods so the mean is exact.
        let m = compute_rms_peak(&sine(100.0, 48000.0, 48000, amp));
        assert!((m.rms - amp / std::f64::consts::SQRT_2).abs() < 1e-3);
        assert!((m.peak - amp).abs() < 1e-3);
        assert!((m.crest - std::f64::consts::SQRT_2).abs() < 1e-2);
    }

    #[test]
    fn test_spectrum_peaks_at_the_tone() {
        let sr = 48000.0;
        let n = 512;
        // Put the tone exactly on bin 32.
        let freq = 32.0 * sr / n as f64;
        let spectrum = compute_spectrum(&sine(freq, sr, 4096, 0.8), sr, n);
        let max_bin = spectrum
            .mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(max_bin, 32);
        assert!((spectrum.mags[32] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_tracks_a_pure_tone() {
        let sr = 48000.0;
        let n = 512;
        let bin_width = sr / n as f64;
        let freq = 32.0 * bin_width;
        let spectrum = compute_spectrum(&sine(freq, sr, 4096, 0.8), sr, n);
        assert!(
            (spectrum.centroid_hz - freq).abs() < bin_width,
            "centroid {} not within one bin of {}",
            spectrum.centroid_hz,
            freq
        );
    }

    #[test]
    fn test_direct_dft_matches_rustfft() {
        use rustfft::num_complex::Complex;
        use rustfft::FftPlanner;

        let sr = 48000.0;
        let n = 256;
        let samples = {
            let mut s = sine(1000.0, sr, n, 0.5);
            let other = sine(7300.0, sr, n, 0.3);
            for (a, b) in s.iter_mut().zip(other) {
                *a += b;
            }
            s
        };

        let direct = compute_spectrum(&samples, sr, n);

        let window: Vec<f64> = (0..n).map(|i| hann(i, n)).collect();
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(n).process(&mut buffer);
        let mut fft_mags: Vec<f64> = buffer[..n / 2].iter().map(|c| c.norm()).collect();
        normalize_by_peak(&mut fft_mags);

        for (k, (&a, &b)) in direct.mags.iter().zip(fft_mags.iter()).enumerate() {
            assert!((a - b).abs() < 1e-9, "bin {k}: {a} vs {b}");
        }
    }

    #[test]
    fn test_bin_spectrum_keeps_bucket_maxima() {
        let mut mags = vec![0.0; 256];
        mags[10] = 1.0;
        mags[200] = 0.5;
        let binned = bin_spectrum(&mags, 64);
        assert_eq!(binned.len(), 64);
        assert_eq!(binned[2], 1.0); // 10 falls in bucket 2
        assert_eq!(binned[50], 0.5); // 200 falls in bucket 50
    }

    #[test]
    fn test_spectrogram_respects_frame_budget_and_covers_span() {
        let sr = 48000.0;
        let samples = sine(440.0, sr, 48000, 0.5);
        let window = 1024;
        let hop = 512;
        // A budget well under the available frame count forces the
        // stride up, so this exercises the whole-span coverage rule.
        let max_frames = 24;
        let gram = compute_spectrogram(&samples, sr, 64, window, hop, max_frames);

        assert!(gram.frames.len() <= max_frames);
        assert!(gram.frames.len() > max_frames / 2);

        // Reconstruct the stride to check the last frame lands near the end.
        let total = (samples.len() - window) / hop + 1;
        let stride = total.div_ceil(max_frames).max(1);
        let last_start = (gram.frames.len() - 1) * hop * stride;
        assert!(samples.len() - (last_start + window) < hop * stride);
    }

    #[test]
    fn test_spectrogram_short_input() {
        let gram = compute_spectrogram(&[0.0; 100], 48000.0, 64, 1024, 512, 120);
        assert!(gram.frames.is_empty());
    }
}
