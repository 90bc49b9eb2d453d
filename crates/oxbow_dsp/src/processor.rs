//! Audio Processor Trait
//!
//! Defines the interface every stage of the channel strip implements
//! (HPF -> Transformer -> EQ -> Compressor -> Limiter).

use crate::block::AudioBlock;
use crate::error::DspError;

/// Context passed to processors containing stream metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    pub sample_rate: f32,
    pub block_size: usize,
}

impl ProcessContext {
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }

    /// Build a context, rejecting rates and block sizes no stage can use
    pub fn try_new(sample_rate: f32, block_size: usize) -> Result<Self, DspError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        if block_size == 0 {
            return Err(DspError::InvalidBlockSize(block_size));
        }
        Ok(Self::new(sample_rate, block_size))
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::new(44100.0, 512)
    }
}

/// What a stage will do with the next block
///
/// Evaluated whenever a parameter changes, never per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMode {
    /// Switched out by the user: skipped, zero cost
    Bypassed,
    /// Enabled, but every parameter sits at its neutral value: pass-through
    Neutral,
    /// Enabled and changing the signal
    Active,
}

impl StageMode {
    #[inline]
    pub fn is_active(self) -> bool {
        self == StageMode::Active
    }
}

/// Trait for audio processors in the strip
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - O(n) time complexity where n = block size
///
/// Anything that allocates or derives coefficients belongs in `prepare()`
/// or in a parameter setter.
pub trait AudioProcessor: Send {
    /// Derive all coefficients for the sample rate and clear state
    fn prepare(&mut self, context: &ProcessContext);

    /// Process a block in place
    fn process(&mut self, block: &mut AudioBlock<'_>);

    /// Zero filter and envelope state; coefficients and parameters are kept
    fn reset(&mut self);

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;

    /// Current processing mode
    fn mode(&self) -> StageMode {
        StageMode::Active
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Run a mono buffer through a processor
    pub fn process_mono<P: AudioProcessor>(processor: &mut P, samples: &mut [f32]) {
        let mut block = AudioBlock::mono(samples);
        processor.process(&mut block);
    }

    /// Run a stereo pair through a processor
    pub fn process_stereo<P: AudioProcessor>(processor: &mut P, left: &mut [f32], right: &mut [f32]) {
        let mut block = AudioBlock::stereo(left, right).expect("equal length channels");
        processor.process(&mut block);
    }

    /// Sine test signal
    pub fn sine(freq: f32, amplitude: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin() * amplitude)
            .collect()
    }

    /// Deterministic broadband signal in [-amplitude, amplitude]
    pub fn noise(amplitude: f32, len: usize) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32 * 2.0 - 1.0) * amplitude
            })
            .collect()
    }

    /// Largest magnitude in a slice
    pub fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    /// Assert that processing silence after `reset()` yields silence
    pub fn assert_reset_gives_silence<P: AudioProcessor>(processor: &mut P) {
        let mut warmup = noise(0.9, 2048);
        let mut warmup_r = noise(0.5, 2048);
        process_stereo(processor, &mut warmup, &mut warmup_r);

        processor.reset();

        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        process_stereo(processor, &mut left, &mut right);
        assert!(
            left.iter().chain(right.iter()).all(|s| *s == 0.0),
            "{} produced output from silence after reset",
            processor.name()
        );
    }
}
