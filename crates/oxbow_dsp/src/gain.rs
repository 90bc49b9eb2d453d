//! Gain/Phase Stage
//!
//! Smoothed input gain, polarity inversion and smoothed output trim for
//! the preamp section of the strip.
//!
//! Gain changes glide exponentially towards their target (20ms time
//! constant) so automation never produces zipper noise. The glide advances
//! once per frame and the same value is applied to every channel of that
//! frame.

use crate::block::AudioBlock;
use crate::coeffs::{clamp_finite, db_to_linear, one_pole_coefficient, smooth_towards};

/// Time constant for every smoothed gain in the strip
pub const SMOOTHING_TIME_MS: f32 = 20.0;

pub const INPUT_GAIN_MIN_DB: f32 = 0.0;
pub const INPUT_GAIN_MAX_DB: f32 = 60.0;
pub const OUTPUT_TRIM_MIN_DB: f32 = -20.0;
pub const OUTPUT_TRIM_MAX_DB: f32 = 10.0;

/// Remaining distance below which a glide snaps onto its target
const SNAP_THRESHOLD: f32 = 1.0e-5;

/// Linear gain that chases its target with one-pole smoothing
#[derive(Debug, Clone, Copy)]
pub struct SmoothedGain {
    current: f32,
    target: f32,
    coeff: f32,
}

impl SmoothedGain {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
        }
    }

    /// Derive the smoothing coefficient and jump straight to the target
    pub fn prepare(&mut self, sample_rate: f32) {
        self.coeff = one_pole_coefficient(sample_rate, SMOOTHING_TIME_MS);
        self.snap();
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Land on the target now, keeping the smoothing coefficient
    pub fn snap(&mut self) {
        self.current = self.target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Settled exactly at unity: multiplying would be a no-op
    #[inline]
    pub fn is_unity(&self) -> bool {
        self.current == 1.0 && self.target == 1.0
    }

    /// Advance one frame and return the gain for it
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.current != self.target {
            let next = smooth_towards(self.current, self.target, self.coeff);
            // A step that rounds away to nothing would leave the glide stuck short of the target
            self.current = if next == self.current || (self.target - next).abs() < SNAP_THRESHOLD {
                self.target
            } else {
                next
            };
        }
        self.current
    }

    /// Multiply every frame of the block by the gliding gain
    pub fn apply(&mut self, block: &mut AudioBlock<'_>) {
        if self.is_unity() {
            return;
        }

        let (left, right) = block.split_mut();
        match right {
            Some(right) => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    let gain = self.next_value();
                    *l *= gain;
                    *r *= gain;
                }
            }
            None => {
                for sample in left.iter_mut() {
                    *sample *= self.next_value();
                }
            }
        }
    }
}

impl Default for SmoothedGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Preamp gain staging: input gain + polarity before the HPF, trim after
/// the transformer
#[derive(Debug, Clone, Copy, Default)]
pub struct GainStage {
    input_gain_db: f32,
    output_trim_db: f32,
    phase_inverted: bool,
    input_gain: SmoothedGain,
    output_trim: SmoothedGain,
}

impl GainStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.input_gain.prepare(sample_rate);
        self.output_trim.prepare(sample_rate);
    }

    /// Land both glides on their targets
    pub fn reset(&mut self) {
        self.input_gain.snap();
        self.output_trim.snap();
    }

    /// Input gain, 0 to +60 dB
    pub fn set_input_gain_db(&mut self, gain_db: f32) {
        self.input_gain_db = clamp_finite(gain_db, INPUT_GAIN_MIN_DB, INPUT_GAIN_MAX_DB);
        self.input_gain.set_target(db_to_linear(self.input_gain_db));
    }

    /// Output trim, -20 to +10 dB
    pub fn set_output_trim_db(&mut self, trim_db: f32) {
        self.output_trim_db = clamp_finite(trim_db, OUTPUT_TRIM_MIN_DB, OUTPUT_TRIM_MAX_DB);
        self.output_trim.set_target(db_to_linear(self.output_trim_db));
    }

    pub fn set_phase_inverted(&mut self, inverted: bool) {
        self.phase_inverted = inverted;
    }

    pub fn input_gain_db(&self) -> f32 {
        self.input_gain_db
    }

    pub fn output_trim_db(&self) -> f32 {
        self.output_trim_db
    }

    pub fn is_phase_inverted(&self) -> bool {
        self.phase_inverted
    }

    /// Input gain followed by optional polarity flip
    pub fn process_input(&mut self, block: &mut AudioBlock<'_>) {
        self.input_gain.apply(block);

        if self.phase_inverted {
            for channel in block.channels_mut() {
                for sample in channel.iter_mut() {
                    *sample = -*sample;
                }
            }
        }
    }

    /// Output trim
    pub fn process_trim(&mut self, block: &mut AudioBlock<'_>) {
        self.output_trim.apply(block);
    }
}
