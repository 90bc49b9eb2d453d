//! Transformer Saturation
//!
//! Models the coloration of console input/output transformers:
//! - Asymmetric soft saturation (even harmonics)
//! - Low-frequency "weight" from core saturation
//! - High-frequency "silk" from transformer resonance
//! - DC blocking to remove the offset the asymmetry introduces
//!
//! Below 0.1% drive the stage is a bit-exact pass-through.

use crate::block::{AudioBlock, MAX_CHANNELS};
use crate::coeffs::{clamp_finite, one_pole_lowpass_coefficient, one_pole_pole};
use crate::processor::{AudioProcessor, ProcessContext, StageMode};
use crate::saturation::transformer_curve;

pub const DRIVE_MIN_PERCENT: f32 = 0.0;
pub const DRIVE_MAX_PERCENT: f32 = 100.0;

/// Normalized drive below which the stage does nothing
const DRIVE_EPSILON: f32 = 0.001;

/// Corner of the low-frequency "weight" tracker
const WEIGHT_FREQ_HZ: f32 = 100.0;
const WEIGHT_AMOUNT: f32 = 0.3;

/// Corner of the high-frequency "silk" extractor
const SILK_FREQ_HZ: f32 = 8000.0;
const SILK_AMOUNT: f32 = 0.15;

/// DC blocker corner
const DC_BLOCK_HZ: f32 = 20.0;

/// Filter memories for one channel
#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    low: f32,
    high: f32,
    dc: f32,
}

/// Input/output transformer emulation
#[derive(Debug, Clone)]
pub struct Transformer {
    sample_rate: f32,
    drive_percent: f32,
    /// Normalized 0.0 - 1.0
    drive: f32,
    /// Pre-saturation gain, 1.0 - 4.0
    drive_gain: f32,
    low_coeff: f32,
    high_pole: f32,
    dc_coeff: f32,
    channels: [ChannelState; MAX_CHANNELS],
}

impl Transformer {
    pub fn new(sample_rate: f32) -> Self {
        let mut transformer = Self {
            sample_rate,
            drive_percent: 0.0,
            drive: 0.0,
            drive_gain: 1.0,
            low_coeff: 0.0,
            high_pole: 0.0,
            dc_coeff: 0.995,
            channels: [ChannelState::default(); MAX_CHANNELS],
        };
        transformer.update_coefficients();
        transformer
    }

    /// Drive amount, 0 - 100%
    pub fn set_drive(&mut self, drive_percent: f32) {
        self.drive_percent = clamp_finite(drive_percent, DRIVE_MIN_PERCENT, DRIVE_MAX_PERCENT);
        self.drive = self.drive_percent / 100.0;
        self.drive_gain = 1.0 + self.drive * 3.0;
    }

    pub fn drive_percent(&self) -> f32 {
        self.drive_percent
    }

    fn update_coefficients(&mut self) {
        self.low_coeff = one_pole_lowpass_coefficient(WEIGHT_FREQ_HZ, self.sample_rate);
        self.high_pole = one_pole_pole(SILK_FREQ_HZ, self.sample_rate);
        self.dc_coeff = 1.0 - DC_BLOCK_HZ / self.sample_rate;
    }

    #[inline]
    fn process_sample(&self, state: &mut ChannelState, sample: f32) -> f32 {
        let drive = self.drive;

        // Low-frequency enhancement (transformer "weight")
        let low = state.low + self.low_coeff * (sample - state.low);
        state.low = low;
        let weight = (low - sample) * drive * WEIGHT_AMOUNT;

        // High-frequency "silk" (subtle presence lift)
        let high = sample - state.high;
        state.high += (1.0 - self.high_pole) * high;
        let silk = high * drive * SILK_AMOUNT;

        let processed = transformer_curve(sample + weight, drive, self.drive_gain) + silk;

        let blocked = processed - state.dc;
        state.dc = processed - blocked * self.dc_coeff;
        blocked
    }
}

impl AudioProcessor for Transformer {
    fn prepare(&mut self, context: &ProcessContext) {
        self.sample_rate = context.sample_rate;
        self.update_coefficients();
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBlock<'_>) {
        if self.drive < DRIVE_EPSILON {
            return;
        }

        let mut states = self.channels;
        for (channel, state) in block.channels_mut().zip(states.iter_mut()) {
            for sample in channel.iter_mut() {
                *sample = self.process_sample(state, *sample);
            }
        }
        self.channels = states;
    }

    fn reset(&mut self) {
        self.channels = [ChannelState::default(); MAX_CHANNELS];
    }

    fn name(&self) -> &'static str {
        "Transformer"
    }

    fn mode(&self) -> StageMode {
        if self.drive < DRIVE_EPSILON {
            StageMode::Neutral
        } else {
            StageMode::Active
        }
    }
}
