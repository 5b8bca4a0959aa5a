//! Sonotype domain model.
//!
//! This crate defines the personality-trait catalog and everything derived
//! directly from it, with no DSP attached:
//!
//! - [`TraitDef`] - the static catalog of fifteen personality axes
//! - [`TraitValues`] - the user's slider positions, one scalar in [-1, 1] per axis
//! - [`Harmonic`] - the per-trait sinusoidal contribution consumed by the renderers
//! - share tokens - a compact, URL-embeddable serialization of [`TraitValues`]
//!
//! # Ordering
//!
//! Trait declaration order is significant and stable: it is reused as the
//! `color_index` of each derived harmonic (visual identity) and as the
//! composer's voice ordering. New traits go at the end.
//!
//! # Purity
//!
//! Everything here is a pure function of its inputs. Mapping a trait value to
//! a harmonic is total: any finite or non-finite input produces finite
//! amplitude, frequency and phase.

mod error;
mod harmonic;
mod share;
mod traits;
mod values;

pub use error::SpecError;
pub use harmonic::{harmonics_from_values, score_map, Harmonic, ScoreMap};
pub use share::{decode_token, encode_token};
pub use traits::{trait_by_key, HarmonicParams, TraitDef, TRAITS};
pub use values::TraitValues;
