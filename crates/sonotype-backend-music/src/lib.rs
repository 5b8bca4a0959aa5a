//! Sonotype music backend.
//!
//! Turns a harmonic set into a short, fully composed multi-voice piece:
//! the strongest harmonics become melodic voices, trait scores set the
//! global feel (tempo, swing, width, shape, scale, echo, compression)
//! through a declared modulation table, and a step scheduler lays
//! percussion and gated voice events onto an eighth-note grid.
//!
//! # Determinism
//!
//! The note schedule is a pure function of the harmonic set and
//! duration: the per-step voice gate is a sine hash of voice and step
//! index, deliberately not a seeded RNG, so it reproduces bit-for-bit.
//! The only seeded element is the hat noise timbre, which flows through
//! the audio backend's PCG32 plumbing; a fixed seed makes the whole
//! render byte-identical.
//!
//! # Module structure
//!
//! - [`modulation`] - trait-score routing table for global parameters
//! - [`scale`] - note tables and pitch quantization
//! - [`voice`] - the three-oscillator unison voice model
//! - [`percussion`] - hat and kick renderers
//! - [`compose`] - the scheduler and [`compose::render_music`]

pub mod compose;
pub mod modulation;
pub mod percussion;
pub mod scale;
pub mod voice;

pub use compose::{render_music, MusicParams, DEFAULT_DURATION, VOICE_POOL};
pub use voice::VoiceEvent;
