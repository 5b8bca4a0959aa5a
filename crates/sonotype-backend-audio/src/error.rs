//! Error types for the signal backend.

use thiserror::Error;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur while rendering, analyzing or decoding audio.
///
/// A failed render or decode aborts only that operation; nothing here is
/// fatal to the session and every entry point can simply be retried.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Invalid sample rate.
    #[error("invalid sample rate: {rate} Hz")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: f64,
    },

    /// Invalid render duration.
    #[error("invalid duration: {duration} seconds")]
    InvalidDuration {
        /// The invalid duration.
        duration: f64,
    },

    /// An operation needed samples and got none.
    #[error("empty sample buffer")]
    EmptyBuffer,

    /// Channel count outside what the pipeline handles.
    #[error("unsupported channel count: {channels}")]
    UnsupportedChannels {
        /// The channel count found.
        channels: u16,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// User audio could not be decoded.
    #[error("decode failed: {message}")]
    Decode {
        /// What the decoder rejected.
        message: String,
    },

    /// Malformed signal graph (bad connection or missing input).
    #[error("signal graph error: {message}")]
    Graph {
        /// What is wrong with the topology.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a graph topology error.
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
        }
    }
}
