//! Per-channel biquad sections
//!
//! One second-order section shared by up to [`MAX_CHANNELS`] channels.
//! The coefficients are common; each channel owns its own delay registers
//! so state never aliases across channels.

use biquad::{Biquad, DirectForm1};

use crate::block::MAX_CHANNELS;
use crate::coeffs::{self, FilterCoefficients};

/// Direct Form I delay registers `(x1, x2, y1, y2)` plus the section taps
pub type FilterState = DirectForm1<f32>;

/// A biquad section with independent state per channel
///
/// Direct Form I is used (rather than the transposed form) so that
/// identity coefficients leave the signal untouched and a coefficient
/// change never rescales stored state.
#[derive(Debug, Clone, Copy)]
pub struct ChannelFilters {
    states: [FilterState; MAX_CHANNELS],
    coefficients: FilterCoefficients,
}

impl ChannelFilters {
    pub fn new(coefficients: FilterCoefficients) -> Self {
        Self {
            states: [DirectForm1::<f32>::new(coefficients); MAX_CHANNELS],
            coefficients,
        }
    }

    /// Sections that pass everything through
    pub fn pass_through() -> Self {
        Self::new(coeffs::identity())
    }

    /// Swap in new coefficients, keeping the delay registers
    pub fn set_coefficients(&mut self, coefficients: FilterCoefficients) {
        for state in &mut self.states {
            state.update_coefficients(coefficients);
        }
        self.coefficients = coefficients;
    }

    pub fn coefficients(&self) -> FilterCoefficients {
        self.coefficients
    }

    /// Run one sample through the given channel's section
    ///
    /// `y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]`
    #[inline]
    pub fn run(&mut self, channel: usize, sample: f32) -> f32 {
        self.states[channel].run(sample)
    }

    /// Filter a whole channel slice in place
    #[inline]
    pub fn process_channel(&mut self, channel: usize, samples: &mut [f32]) {
        let state = &mut self.states[channel];
        for sample in samples.iter_mut() {
            *sample = state.run(*sample);
        }
    }

    /// Zero all delay registers, keeping coefficients
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.reset_state();
        }
    }
}

impl Default for ChannelFilters {
    fn default() -> Self {
        Self::pass_through()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coeffs::{high_pass, Q_BUTTERWORTH};

    #[test]
    fn test_channels_do_not_share_state() {
        let mut filters = ChannelFilters::new(high_pass(100.0, Q_BUTTERWORTH, 48000.0));

        // Drive only the left channel
        for _ in 0..64 {
            filters.run(0, 1.0);
        }

        // Right channel state is still zero: a zero input gives zero output
        assert_eq!(filters.run(1, 0.0), 0.0);
        assert_ne!(filters.run(0, 0.0), 0.0);
    }

    #[test]
    fn test_reset_clears_registers() {
        let mut filters = ChannelFilters::new(high_pass(300.0, Q_BUTTERWORTH, 48000.0));
        let mut samples = vec![0.7; 32];
        filters.process_channel(0, &mut samples);

        filters.reset();

        let mut silence = vec![0.0; 16];
        filters.process_channel(0, &mut silence);
        assert!(silence.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_coefficient_update_keeps_coefficients_readable() {
        let mut filters = ChannelFilters::pass_through();
        let hp = high_pass(80.0, Q_BUTTERWORTH, 44100.0);
        filters.set_coefficients(hp);
        assert_eq!(filters.coefficients().b0, hp.b0);
        assert_eq!(filters.coefficients().a2, hp.a2);
    }
}
