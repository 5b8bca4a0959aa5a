//! Sonotype signal backend.
//!
//! Everything between a harmonic set and a finished sample buffer:
//!
//! - [`render`] - additive render of the harmonic set (mono)
//! - [`colorize`] - trait colorization of user audio (stereo)
//! - [`graph`] - the offline signal graph both renders pour into
//! - [`analysis`] - windowed DFT spectrum, spectrogram, level metering
//! - [`wav`] - deterministic 16-bit WAV encode, plus decode for user audio
//!
//! # Determinism
//!
//! Rendering is offline and reproducible. The only stochastic element on
//! this side of the workspace is quantization dither, and it draws from a
//! PCG32 stream seeded through [`rng`], so a fixed seed gives
//! byte-identical WAV output. The analyzer uses a direct DFT with no
//! randomness at all.
//!
//! # Failure model
//!
//! Every entry point returns [`AudioResult`]; a failed render or decode
//! aborts only itself and the caller can retry with new inputs. Stages in
//! the signal graph scrub non-finite samples to silence rather than
//! letting a bad parameter poison the buffer.

pub mod analysis;
pub mod automation;
pub mod colorize;
pub mod error;
pub mod filter;
pub mod graph;
pub mod mixer;
pub mod oscillator;
pub mod render;
pub mod rng;
pub mod wav;

pub use colorize::{colorize, ColorProfile};
pub use error::{AudioError, AudioResult};
pub use mixer::{MixerOutput, StereoOutput};
pub use render::render_signal;
pub use wav::WavResult;
