//! Error types for the domain model.

use thiserror::Error;

/// Errors produced by trait-value mutation and share-token decoding.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The trait key is not in the catalog.
    #[error("unknown trait key: {key}")]
    UnknownTrait {
        /// The offending key.
        key: String,
    },

    /// A trait value was NaN or infinite.
    #[error("non-finite value for trait '{key}'")]
    NonFiniteValue {
        /// The trait the value was meant for.
        key: String,
    },

    /// A share token could not be decoded.
    ///
    /// Decoding fails closed: the caller's state is untouched.
    #[error("invalid share token: {message}")]
    InvalidToken {
        /// What went wrong.
        message: String,
    },
}

impl SpecError {
    /// Creates an invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }
}
