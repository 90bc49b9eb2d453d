//! DSP Error Types

use thiserror::Error;

/// Errors that can occur when setting up DSP processing
///
/// The per-sample path never fails; these only come out of block
/// construction, context validation and filter design.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Invalid filter coefficients for frequency {frequency} Hz at sample rate {sample_rate} Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: f32 },

    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("Block size must be at least one frame, got {0}")]
    InvalidBlockSize(usize),

    #[error("Buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("Unsupported channel count: {0} (must be 1 or 2)")]
    UnsupportedChannelCount(usize),
}
