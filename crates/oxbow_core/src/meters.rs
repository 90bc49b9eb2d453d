//! Metering Taps
//!
//! Peak and gain-reduction meters written by the audio thread once per
//! block and readable from any thread.

use oxbow_dsp::MAX_CHANNELS;
use serde::{Deserialize, Serialize};

use crate::params::AtomicF32;

/// Plain copy of every meter, for a UI poller
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterSnapshot {
    /// Per-channel block peak before the chain (linear)
    pub input_peak: [f32; MAX_CHANNELS],
    /// Per-channel block peak after the output stage (linear)
    pub output_peak: [f32; MAX_CHANNELS],
    /// Largest compressor reduction of the last block, dB (positive)
    pub compressor_reduction_db: f32,
    /// Largest limiter reduction of the last block, dB (positive)
    pub limiter_reduction_db: f32,
}

impl MeterSnapshot {
    /// Louder of the two input channels
    pub fn input_level(&self) -> f32 {
        self.input_peak[0].max(self.input_peak[1])
    }

    /// Louder of the two output channels
    pub fn output_level(&self) -> f32 {
        self.output_peak[0].max(self.output_peak[1])
    }
}

#[derive(Debug, Default)]
pub struct StripMeters {
    input_peak: [AtomicF32; MAX_CHANNELS],
    output_peak: [AtomicF32; MAX_CHANNELS],
    compressor_reduction_db: AtomicF32,
    limiter_reduction_db: AtomicF32,
}

impl StripMeters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_input_peaks(&self, peaks: [f32; MAX_CHANNELS]) {
        for (cell, peak) in self.input_peak.iter().zip(peaks) {
            cell.store(peak);
        }
    }

    pub(crate) fn set_output_peaks(&self, peaks: [f32; MAX_CHANNELS]) {
        for (cell, peak) in self.output_peak.iter().zip(peaks) {
            cell.store(peak);
        }
    }

    pub(crate) fn set_gain_reduction(&self, compressor_db: f32, limiter_db: f32) {
        self.compressor_reduction_db.store(compressor_db);
        self.limiter_reduction_db.store(limiter_db);
    }

    pub(crate) fn clear(&self) {
        self.set_input_peaks([0.0; MAX_CHANNELS]);
        self.set_output_peaks([0.0; MAX_CHANNELS]);
        self.set_gain_reduction(0.0, 0.0);
    }

    pub fn input_peaks(&self) -> [f32; MAX_CHANNELS] {
        [self.input_peak[0].load(), self.input_peak[1].load()]
    }

    pub fn output_peaks(&self) -> [f32; MAX_CHANNELS] {
        [self.output_peak[0].load(), self.output_peak[1].load()]
    }

    pub fn compressor_reduction_db(&self) -> f32 {
        self.compressor_reduction_db.load()
    }

    pub fn limiter_reduction_db(&self) -> f32 {
        self.limiter_reduction_db.load()
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            input_peak: self.input_peaks(),
            output_peak: self.output_peaks(),
            compressor_reduction_db: self.compressor_reduction_db(),
            limiter_reduction_db: self.limiter_reduction_db(),
        }
    }
}
