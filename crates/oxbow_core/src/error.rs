//! Strip Error Types

use thiserror::Error;

/// Errors that can occur outside the real-time path of the strip
#[derive(Error, Debug)]
pub enum StripError {
    #[error("Invalid sample rate: {0} Hz (must be 8000-192000)")]
    InvalidSampleRate(u32),

    #[error("Invalid channel count: {0} (must be 1 or 2)")]
    InvalidChannelCount(u16),

    #[error("Invalid block size: {0} frames (must be 1-8192)")]
    InvalidBlockSize(usize),

    #[error("Interleaved buffer of {len} samples is not a whole number of {channels}-channel frames")]
    RaggedInterleavedBuffer { len: usize, channels: usize },

    #[error("DSP error: {0}")]
    DspError(#[from] oxbow_dsp::DspError),

    #[error("Could not determine config directory")]
    NoConfigDirectory,

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for strip operations
pub type StripResult<T> = Result<T, StripError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StripError::InvalidSampleRate(100);
        assert!(err.to_string().contains("100 Hz"));

        let err = StripError::RaggedInterleavedBuffer { len: 7, channels: 2 };
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn test_error_from_dsp() {
        let dsp_err = oxbow_dsp::DspError::UnsupportedChannelCount(4);
        let strip_err: StripError = dsp_err.into();
        assert!(matches!(strip_err, StripError::DspError(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let strip_err: StripError = json_err.into();
        assert!(matches!(strip_err, StripError::Json(_)));
    }
}
