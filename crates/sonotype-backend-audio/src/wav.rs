//! WAV encode and decode.
//!
//! Output is 16-bit PCM little-endian with the standard 44-byte
//! RIFF/WAVE/fmt/data header and no variable metadata, so equal samples
//! always produce equal files. Quantization applies light triangular
//! dither from a seeded stream, slightly raised over the final half
//! second where fade tails would otherwise truncate audibly.
//!
//! Input (user audio for colorization) goes through hound, then the
//! nearest-index resampler and an equal-weight mono downmix.

use std::io::Cursor;

use rand::Rng;

use crate::error::{AudioError, AudioResult};
use crate::mixer::StereoOutput;
use crate::rng::create_component_rng;

/// Base dither amplitude: 0.6 LSB of 16-bit full scale.
const DITHER_AMP: f64 = 0.6 / 32768.0;

/// Dither multiplier over the final 0.5 s.
const TAIL_DITHER_GAIN: f64 = 1.6;

/// WAV format parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample; this writer always produces 16.
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Mono 16-bit format.
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    /// Stereo 16-bit format.
    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    /// Bytes per sample frame.
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Header fields read back from a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size (file length minus 8).
    pub riff_size: u32,
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Payload size of the data chunk in bytes.
    pub data_size: u32,
}

/// Writes a complete WAV file around already-quantized PCM bytes.
pub fn write_wav_to_vec(format: &WavFormat, pcm_data: &[u8]) -> Vec<u8> {
    let data_size = pcm_data.len() as u32;
    let mut out = Vec::with_capacity(44 + pcm_data.len());

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm_data);

    out
}

/// Quantizes channel-planar f64 samples to interleaved dithered PCM16.
///
/// All channels must share a length; samples are clamped to [-1, 1]
/// after dithering. The dither stream is derived from `seed`, so equal
/// inputs keep producing byte-identical files.
pub fn quantize_pcm16(channels: &[&[f64]], sample_rate: u32, seed: u32) -> AudioResult<Vec<u8>> {
    let num_channels = channels.len();
    if num_channels == 0 || num_channels > 2 {
        return Err(AudioError::UnsupportedChannels {
            channels: num_channels as u16,
        });
    }
    let num_frames = channels[0].len();
    if channels.iter().any(|ch| ch.len() != num_frames) {
        return Err(AudioError::invalid_param(
            "channels",
            "channel lengths differ",
        ));
    }

    let mut rng = create_component_rng(seed, "dither");
    let tail_start = num_frames.saturating_sub((sample_rate as f64 * 0.5).round() as usize);

    let mut pcm = Vec::with_capacity(num_frames * num_channels * 2);
    for i in 0..num_frames {
        let amp = if i >= tail_start {
            DITHER_AMP * TAIL_DITHER_GAIN
        } else {
            DITHER_AMP
        };
        for ch in channels {
            let dither = (rng.gen::<f64>() - rng.gen::<f64>()) * amp;
            let s = (ch[i] + dither).clamp(-1.0, 1.0);
            let q = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
            pcm.extend_from_slice(&(q as i16).to_le_bytes());
        }
    }
    Ok(pcm)
}

/// Result of WAV file generation.
#[derive(Debug)]
pub struct WavResult {
    /// Complete WAV file bytes.
    pub wav_data: Vec<u8>,
    /// BLAKE3 hash of the PCM payload, for reproducibility checks.
    pub pcm_hash: String,
    /// Whether the output is stereo.
    pub is_stereo: bool,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per channel.
    pub num_samples: usize,
}

impl WavResult {
    /// Encodes mono samples.
    pub fn from_mono(samples: &[f64], sample_rate: u32, seed: u32) -> AudioResult<Self> {
        let pcm = quantize_pcm16(&[samples], sample_rate, seed)?;
        let pcm_hash = blake3::hash(&pcm).to_hex().to_string();
        let wav_data = write_wav_to_vec(&WavFormat::mono(sample_rate), &pcm);
        Ok(Self {
            wav_data,
            pcm_hash,
            is_stereo: false,
            sample_rate,
            num_samples: samples.len(),
        })
    }

    /// Encodes a stereo buffer.
    pub fn from_stereo(stereo: &StereoOutput, sample_rate: u32, seed: u32) -> AudioResult<Self> {
        let pcm = quantize_pcm16(&[&stereo.left, &stereo.right], sample_rate, seed)?;
        let pcm_hash = blake3::hash(&pcm).to_hex().to_string();
        let wav_data = write_wav_to_vec(&WavFormat::stereo(sample_rate), &pcm);
        Ok(Self {
            wav_data,
            pcm_hash,
            is_stereo: true,
            sample_rate,
            num_samples: stereo.len(),
        })
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.num_samples as f64 / self.sample_rate as f64
    }
}

/// Parses the fixed header fields of a WAV file.
///
/// Walks the chunk list, so files with extra chunks between `fmt ` and
/// `data` still parse.
pub fn parse_header(wav_data: &[u8]) -> AudioResult<WavHeader> {
    if wav_data.len() < 44 {
        return Err(AudioError::decode("file shorter than a WAV header"));
    }
    if &wav_data[0..4] != b"RIFF" || &wav_data[8..12] != b"WAVE" {
        return Err(AudioError::decode("not a RIFF/WAVE file"));
    }
    let riff_size = u32::from_le_bytes(wav_data[4..8].try_into().unwrap());

    let mut fmt: Option<(u16, u32, u16)> = None;
    let mut data_size: Option<u32> = None;
    let mut pos = 12;
    while pos + 8 <= wav_data.len() {
        let chunk_id = &wav_data[pos..pos + 4];
        let chunk_size =
            u32::from_le_bytes(wav_data[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body = pos + 8;

        if chunk_id == b"fmt " && body + 16 <= wav_data.len() {
            let channels = u16::from_le_bytes(wav_data[body + 2..body + 4].try_into().unwrap());
            let sample_rate =
                u32::from_le_bytes(wav_data[body + 4..body + 8].try_into().unwrap());
            let bits =
                u16::from_le_bytes(wav_data[body + 14..body + 16].try_into().unwrap());
            fmt = Some((channels, sample_rate, bits));
        } else if chunk_id == b"data" {
            data_size = Some(chunk_size as u32);
        }

        pos = body + chunk_size + (chunk_size & 1);
    }

    match (fmt, data_size) {
        (Some((channels, sample_rate, bits_per_sample)), Some(data_size)) => Ok(WavHeader {
            riff_size,
            channels,
            sample_rate,
            bits_per_sample,
            data_size,
        }),
        (None, _) => Err(AudioError::decode("missing fmt chunk")),
        (_, None) => Err(AudioError::decode("missing data chunk")),
    }
}

/// Decodes a WAV file into channel-planar f64 samples and its rate.
///
/// Accepts 16/24/32-bit integer and 32-bit float PCM.
pub fn decode_wav(wav_data: &[u8]) -> AudioResult<(Vec<Vec<f64>>, u32)> {
    let reader = hound::WavReader::new(Cursor::new(wav_data))
        .map_err(|e| AudioError::decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::UnsupportedChannels { channels: 0 });
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u32 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::decode(e.to_string()))?
        }
    };

    let num_channels = spec.channels as usize;
    let num_frames = interleaved.len() / num_channels;
    let mut channels = vec![Vec::with_capacity(num_frames); num_channels];
    for frame in interleaved.chunks_exact(num_channels) {
        for (ch, &s) in channels.iter_mut().zip(frame.iter()) {
            ch.push(s);
        }
    }
    Ok((channels, spec.sample_rate))
}

/// Equal-weight downmix of the first two channels to mono.
pub fn downmix_mono(channels: &[Vec<f64>]) -> Vec<f64> {
    match channels {
        [] => Vec::new(),
        [mono] => mono.clone(),
        [left, right, ..] => left
            .iter()
            .zip(right.iter())
            .map(|(&l, &r)| 0.5 * l + 0.5 * r)
            .collect(),
    }
}

/// Nearest-index resampling to a target rate.
///
/// Deliberately unfiltered; the colorization chain's lowpass sweeps take
/// the edge off, and the original position mapping is kept exactly.
pub fn resample_nearest(samples: &[f64], src_rate: u32, dst_rate: u32) -> AudioResult<Vec<f64>> {
    if src_rate == 0 || dst_rate == 0 {
        return Err(AudioError::InvalidSampleRate {
            rate: src_rate.min(dst_rate) as f64,
        });
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    if src_rate == dst_rate {
        return Ok(samples.to_vec());
    }
    let duration = samples.len() as f64 / src_rate as f64;
    let out_len = (duration * dst_rate as f64).floor() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let t = i as f64 / out_len as f64;
        let src_idx = ((t * samples.len() as f64).floor() as usize).min(samples.len() - 1);
        out.push(samples[src_idx]);
    }
    Ok(out)
}
