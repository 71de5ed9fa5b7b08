//! Core types for the convolution engine
//!
//! Signals are plain `f64` sample sequences. Complex data crossing module
//! boundaries uses the interleaved layout described in [`crate::buffer`].

use crate::config::ConfigError;

/// A real audio sample, nominally in `[-1.0, 1.0]`
pub type Sample = f64;

/// Result type for engine and I/O operations
pub type ConvResult<T> = Result<T, ConvError>;

/// Errors that can occur while convolving or moving signals in and out of files
#[derive(Debug, thiserror::Error)]
pub enum ConvError {
    /// The audio container is unusable: wrong channel count, unsupported
    /// encoding, or a malformed header.
    #[error("Format error: {0}")]
    Format(String),

    /// A buffer handed to the transform engine or spectral multiplier does not
    /// satisfy its size contract.
    #[error("Invalid size in {op}: {reason} (len={len}, k={k})")]
    InvalidSize {
        op: &'static str,
        reason: &'static str,
        len: usize,
        k: usize,
    },

    /// A signal is degenerate (empty), so no transform size can be derived.
    #[error("Invalid input: {reason} (input len={input_len}, impulse len={impulse_len})")]
    InvalidInput {
        reason: &'static str,
        input_len: usize,
        impulse_len: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConvError {
    /// Non-mono container
    pub fn not_mono(channels: u16) -> Self {
        ConvError::Format(format!("file must be mono, found {} channels", channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_lengths() {
        let err = ConvError::InvalidSize {
            op: "transform",
            reason: "k is not a power of two",
            len: 12,
            k: 6,
        };
        let msg = err.to_string();
        assert!(msg.contains("transform"));
        assert!(msg.contains("len=12"));
        assert!(msg.contains("k=6"));

        let err = ConvError::InvalidInput {
            reason: "empty signal",
            input_len: 0,
            impulse_len: 4,
        };
        assert!(err.to_string().contains("impulse len=4"));
    }

    #[test]
    fn test_not_mono() {
        let err = ConvError::not_mono(2);
        assert!(matches!(err, ConvError::Format(_)));
        assert!(err.to_string().contains("2 channels"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.wav");
        let err: ConvError = io.into();
        assert!(matches!(err, ConvError::Io(_)));
    }
}
