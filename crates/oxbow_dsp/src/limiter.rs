//! Safety Limiter
//!
//! Fast peak limiter on a single envelope shared by both channels
//! (0.1ms attack, 50ms release). Beyond 1.5x over threshold the gain is
//! pulled down further to mimic a diode bridge running out of headroom,
//! and a tanh soft clip catches whatever the envelope is too slow for.

use crate::block::AudioBlock;
use crate::coeffs::{clamp_finite, db_to_linear, linear_to_db, one_pole_coefficient};
use crate::processor::{AudioProcessor, ProcessContext, StageMode};
use crate::saturation::safety_clip;

pub const THRESHOLD_MIN_DB: f32 = -20.0;
pub const THRESHOLD_MAX_DB: f32 = 0.0;

const ATTACK_MS: f32 = 0.1;
const RELEASE_MS: f32 = 50.0;

/// Envelope-over-threshold ratio where extra gain reduction kicks in
const HARD_KNEE_RATIO: f32 = 1.5;
const HARD_KNEE_AMOUNT: f32 = 0.5;

/// Limiter gain for an envelope level
///
/// `threshold / envelope` above threshold, with an extra
/// `1 / (1 + (ratio - 1.5) * 0.5)` once the envelope is more than 1.5x
/// over. Unity at or below threshold.
#[inline]
pub fn limiter_gain(envelope: f32, threshold: f32) -> f32 {
    if envelope <= threshold {
        return 1.0;
    }

    let mut gain = threshold / envelope;
    let over_ratio = envelope / threshold;
    if over_ratio > HARD_KNEE_RATIO {
        let excess = over_ratio - HARD_KNEE_RATIO;
        gain *= 1.0 / (1.0 + excess * HARD_KNEE_AMOUNT);
    }
    gain
}

#[derive(Debug, Clone)]
pub struct Limiter {
    sample_rate: f32,
    threshold_db: f32,
    threshold: f32,
    bypassed: bool,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
    gain_reduction_db: f32,
}

impl Limiter {
    /// 0 dBFS ceiling
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            threshold_db: 0.0,
            threshold: 1.0,
            bypassed: false,
            attack_coeff: one_pole_coefficient(sample_rate, ATTACK_MS),
            release_coeff: one_pole_coefficient(sample_rate, RELEASE_MS),
            envelope: 0.0,
            gain_reduction_db: 0.0,
        }
    }

    /// -20 to 0 dB
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = clamp_finite(threshold_db, THRESHOLD_MIN_DB, THRESHOLD_MAX_DB);
        self.threshold = db_to_linear(self.threshold_db);
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn set_bypass(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Largest reduction during the last block, in dB (positive)
    pub fn gain_reduction(&self) -> f32 {
        self.gain_reduction_db
    }

    #[inline]
    fn follow(&mut self, peak: f32) -> f32 {
        let coeff = if peak > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope += coeff * (peak - self.envelope);
        limiter_gain(self.envelope, self.threshold)
    }
}

impl AudioProcessor for Limiter {
    fn prepare(&mut self, context: &ProcessContext) {
        self.sample_rate = context.sample_rate;
        self.attack_coeff = one_pole_coefficient(self.sample_rate, ATTACK_MS);
        self.release_coeff = one_pole_coefficient(self.sample_rate, RELEASE_MS);
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBlock<'_>) {
        if self.bypassed {
            return;
        }

        let threshold = self.threshold;
        let mut max_reduction = 0.0_f32;
        let (left, right) = block.split_mut();

        match right {
            Some(right) => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    let gain = self.follow(l.abs().max(r.abs()));
                    max_reduction = max_reduction.max(linear_to_db(gain).abs());
                    *l = safety_clip(*l * gain, threshold);
                    *r = safety_clip(*r * gain, threshold);
                }
            }
            None => {
                for sample in left.iter_mut() {
                    let gain = self.follow(sample.abs());
                    max_reduction = max_reduction.max(linear_to_db(gain).abs());
                    *sample = safety_clip(*sample * gain, threshold);
                }
            }
        }

        self.gain_reduction_db = max_reduction;
    }

    fn reset(&mut self) {
        self.envelope = 0.0;
        self.gain_reduction_db = 0.0;
    }

    fn name(&self) -> &'static str {
        "Limiter"
    }

    fn mode(&self) -> StageMode {
        if self.bypassed {
            StageMode::Bypassed
        } else {
            StageMode::Active
        }
    }
}
