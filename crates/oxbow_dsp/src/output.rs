//! Output Stage
//!
//! Final smoothed output level, applied after EQ and dynamics.

use crate::block::AudioBlock;
use crate::coeffs::{clamp_finite, db_to_linear};
use crate::gain::SmoothedGain;
use crate::processor::{AudioProcessor, ProcessContext, StageMode};

pub const OUTPUT_LEVEL_MIN_DB: f32 = -20.0;
pub const OUTPUT_LEVEL_MAX_DB: f32 = 10.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputStage {
    level_db: f32,
    level: SmoothedGain,
}

impl OutputStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// -20 to +10 dB
    pub fn set_level_db(&mut self, level_db: f32) {
        self.level_db = clamp_finite(level_db, OUTPUT_LEVEL_MIN_DB, OUTPUT_LEVEL_MAX_DB);
        self.level.set_target(db_to_linear(self.level_db));
    }

    pub fn level_db(&self) -> f32 {
        self.level_db
    }
}

impl AudioProcessor for OutputStage {
    fn prepare(&mut self, context: &ProcessContext) {
        self.level.prepare(context.sample_rate);
    }

    fn process(&mut self, block: &mut AudioBlock<'_>) {
        self.level.apply(block);
    }

    /// Lands the glide on its target
    fn reset(&mut self) {
        self.level.snap();
    }

    fn name(&self) -> &'static str {
        "Output"
    }

    fn mode(&self) -> StageMode {
        if self.level.is_unity() {
            StageMode::Neutral
        } else {
            StageMode::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::test_support::*;

    #[test]
    fn test_unity_is_bit_exact() {
        let mut output = OutputStage::new();
        output.prepare(&ProcessContext::new(48000.0, 256));
        let original = noise(1.0, 256);
        let mut samples = original.clone();
        process_mono(&mut output, &mut samples);
        assert_eq!(samples, original);
        assert_eq!(output.mode(), StageMode::Neutral);
    }

    #[test]
    fn test_level_clamped() {
        let mut output = OutputStage::new();
        output.set_level_db(-60.0);
        assert_eq!(output.level_db(), -20.0);
        output.set_level_db(15.0);
        assert_eq!(output.level_db(), 10.0);
    }

    #[test]
    fn test_nan_level_falls_to_minimum() {
        let mut output = OutputStage::new();
        output.set_level_db(f32::NAN);
        assert_eq!(output.level_db(), OUTPUT_LEVEL_MIN_DB);

        output.prepare(&ProcessContext::new(48000.0, 256));
        let mut samples = vec![0.5; 256];
        process_mono(&mut output, &mut samples);
        assert!(samples.iter().all(|s| (s - 0.05).abs() < 1e-6));
    }

    #[test]
    fn test_level_glides_then_settles() {
        let mut output = OutputStage::new();
        output.prepare(&ProcessContext::new(48000.0, 256));
        output.set_level_db(-6.0);

        let mut samples = vec![1.0; 48000];
        process_mono(&mut output, &mut samples);

        // 20ms glide: the first sample barely moves, one second later it has arrived
        assert!(samples[0] > 0.99);
        assert!((samples[47999] - db_to_linear(-6.0)).abs() < 1e-4);
    }

    #[test]
    fn test_reset_lands_on_target() {
        let mut output = OutputStage::new();
        output.prepare(&ProcessContext::new(48000.0, 256));
        output.set_level_db(6.0);
        output.reset();

        let mut samples = vec![0.5; 4];
        process_mono(&mut output, &mut samples);
        let expected = 0.5 * db_to_linear(6.0);
        assert!(samples.iter().all(|s| (s - expected).abs() < 1e-6));

        // Smoothing survives the reset
        output.set_level_db(0.0);
        let mut samples = vec![0.5; 1];
        process_mono(&mut output, &mut samples);
        assert!(samples[0] > 0.99, "jumped to {}", samples[0]);
    }
}
