//! Strip Configuration

use oxbow_dsp::ProcessContext;
use serde::{Deserialize, Serialize};

use crate::error::{StripError, StripResult};

/// Stream parameters the strip is prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Largest block the host will hand over, in frames
    pub max_block_size: usize,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            max_block_size: 512,
        }
    }
}

impl StripConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            max_block_size: 128, // ~2.6ms latency
            ..Self::default()
        }
    }

    /// Create config optimized for stability
    pub fn stable() -> Self {
        Self {
            max_block_size: 1024, // ~21ms latency
            ..Self::default()
        }
    }

    /// Calculate latency in milliseconds for one full block
    pub fn latency_ms(&self) -> f32 {
        (self.max_block_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> StripResult<()> {
        if !(8000..=192000).contains(&self.sample_rate) {
            return Err(StripError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels == 0 || self.channels > 2 {
            return Err(StripError::InvalidChannelCount(self.channels));
        }
        if self.max_block_size == 0 || self.max_block_size > 8192 {
            return Err(StripError::InvalidBlockSize(self.max_block_size));
        }
        Ok(())
    }

    /// Context handed to every stage's `prepare`
    pub fn process_context(&self) -> StripResult<ProcessContext> {
        Ok(ProcessContext::try_new(self.sample_rate as f32, self.max_block_size)?)
    }
}
