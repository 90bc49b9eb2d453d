//! Stepped High-Pass Filter
//!
//! Switchable 12dB/octave (2-pole Butterworth) high-pass with the classic
//! console steps: Off, 50Hz, 80Hz, 160Hz, 300Hz.
//!
//! Changing the step swaps coefficients without clearing the delay
//! registers, so a short transient on a switch is expected, just like on
//! the hardware.

use crate::block::AudioBlock;
use crate::coeffs::{self, Q_BUTTERWORTH};
use crate::filter::ChannelFilters;
use crate::processor::{AudioProcessor, ProcessContext, StageMode};

/// Cutoff frequencies for each step, index 0 is Off
pub const HPF_FREQUENCIES: [f32; 5] = [0.0, 50.0, 80.0, 160.0, 300.0];

/// Discrete HPF settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HpfSetting {
    #[default]
    Off,
    Hz50,
    Hz80,
    Hz160,
    Hz300,
}

impl HpfSetting {
    pub const ALL: [HpfSetting; 5] = [
        HpfSetting::Off,
        HpfSetting::Hz50,
        HpfSetting::Hz80,
        HpfSetting::Hz160,
        HpfSetting::Hz300,
    ];

    /// Map a selector index to a setting; out-of-range indices clamp to 300Hz
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Cutoff in Hz, `None` when off
    pub fn cutoff_hz(self) -> Option<f32> {
        match self {
            HpfSetting::Off => None,
            other => Some(HPF_FREQUENCIES[other.index()]),
        }
    }
}

/// Stepped 2-pole high-pass
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    setting: HpfSetting,
    sample_rate: f32,
    filters: ChannelFilters,
}

impl HighPassFilter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            setting: HpfSetting::Off,
            sample_rate,
            filters: ChannelFilters::pass_through(),
        }
    }

    /// Select a step by enum
    pub fn set_setting(&mut self, setting: HpfSetting) {
        if setting == self.setting {
            return;
        }
        self.setting = setting;
        self.update_coefficients();
    }

    /// Select a step by index (0 = Off, 1 = 50Hz, 2 = 80Hz, 3 = 160Hz, 4 = 300Hz)
    pub fn set_frequency(&mut self, index: usize) {
        self.set_setting(HpfSetting::from_index(index));
    }

    pub fn setting(&self) -> HpfSetting {
        self.setting
    }

    pub fn coefficients(&self) -> coeffs::FilterCoefficients {
        self.filters.coefficients()
    }

    fn update_coefficients(&mut self) {
        let coefficients = match self.setting.cutoff_hz() {
            Some(cutoff) => coeffs::high_pass(cutoff, Q_BUTTERWORTH, self.sample_rate),
            None => coeffs::identity(),
        };
        self.filters.set_coefficients(coefficients);
    }
}

impl AudioProcessor for HighPassFilter {
    fn prepare(&mut self, context: &ProcessContext) {
        self.sample_rate = context.sample_rate;
        self.update_coefficients();
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBlock<'_>) {
        if self.setting == HpfSetting::Off {
            return;
        }

        for (ch, channel) in block.channels_mut().enumerate() {
            self.filters.process_channel(ch, channel);
        }
    }

    fn reset(&mut self) {
        self.filters.reset();
    }

    fn name(&self) -> &'static str {
        "High-Pass Filter"
    }

    fn mode(&self) -> StageMode {
        match self.setting {
            HpfSetting::Off => StageMode::Neutral,
            _ => StageMode::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coeffs::{linear_to_db, magnitude_at};
    use crate::processor::test_support::*;

    fn prepared(sample_rate: f32) -> HighPassFilter {
        let mut hpf = HighPassFilter::new(sample_rate);
        hpf.prepare(&ProcessContext::new(sample_rate, 512));
        hpf
    }

    #[test]
    fn test_off_is_identity() {
        let mut hpf = prepared(48000.0);
        let mut samples = vec![1.0, -1.0, 0.5];
        process_mono(&mut hpf, &mut samples);
        assert_eq!(samples, vec![1.0, -1.0, 0.5]);

        let c = hpf.coefficients();
        assert_eq!((c.b0, c.b1, c.b2, c.a1, c.a2), (1.0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(hpf.mode(), StageMode::Neutral);
    }

    #[test]
    fn test_switching_back_to_off_restores_identity() {
        let mut hpf = prepared(48000.0);
        hpf.set_frequency(4);
        let mut warm = sine(100.0, 0.5, 48000.0, 256);
        process_mono(&mut hpf, &mut warm);

        hpf.set_frequency(0);
        let original = noise(0.8, 128);
        let mut samples = original.clone();
        process_mono(&mut hpf, &mut samples);
        assert_eq!(samples, original);
        let c = hpf.coefficients();
        assert_eq!((c.b0, c.b1, c.b2, c.a1, c.a2), (1.0, 0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_index_clamping() {
        assert_eq!(HpfSetting::from_index(0), HpfSetting::Off);
        assert_eq!(HpfSetting::from_index(2), HpfSetting::Hz80);
        assert_eq!(HpfSetting::from_index(17), HpfSetting::Hz300);
        assert_eq!(HpfSetting::Hz160.cutoff_hz(), Some(160.0));
        assert_eq!(HpfSetting::Off.cutoff_hz(), None);
    }

    #[test]
    fn test_butterworth_corner() {
        let mut hpf = prepared(48000.0);
        for setting in &HpfSetting::ALL[1..] {
            hpf.set_setting(*setting);
            let cutoff = setting.cutoff_hz().unwrap();
            let gain = linear_to_db(magnitude_at(&hpf.coefficients(), cutoff, 48000.0));
            assert!((gain + 3.0).abs() < 0.1, "{:?}: {} dB at corner", setting, gain);
        }
    }

    #[test]
    fn test_removes_dc() {
        let mut hpf = prepared(44100.0);
        hpf.set_setting(HpfSetting::Hz80);

        let mut samples = vec![0.5; 44100];
        process_mono(&mut hpf, &mut samples);
        assert!(samples[44099].abs() < 1e-3, "residual DC {}", samples[44099]);
    }

    #[test]
    fn test_attenuates_below_cutoff() {
        let mut hpf = prepared(48000.0);
        hpf.set_setting(HpfSetting::Hz300);

        let mut low = sine(60.0, 0.5, 48000.0, 9600);
        process_mono(&mut hpf, &mut low);
        let mut high = sine(3000.0, 0.5, 48000.0, 9600);
        process_mono(&mut hpf, &mut high);

        assert!(peak(&low[4800..]) < 0.05, "60Hz leaked: {}", peak(&low[4800..]));
        assert!(peak(&high[4800..]) > 0.48);
    }

    #[test]
    fn test_switch_does_not_reset_state() {
        let mut a = prepared(48000.0);
        a.set_setting(HpfSetting::Hz50);
        let mut b = a.clone();

        let mut drive = vec![0.9; 64];
        process_mono(&mut a, &mut drive);

        // Switching step keeps the registers, so the tail differs from a fresh filter
        a.set_setting(HpfSetting::Hz160);
        b.set_setting(HpfSetting::Hz160);
        let mut tail_a = vec![0.0; 8];
        let mut tail_b = vec![0.0; 8];
        process_mono(&mut a, &mut tail_a);
        process_mono(&mut b, &mut tail_b);
        assert!(tail_a.iter().any(|s| *s != 0.0));
        assert!(tail_b.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_stereo_channels_independent() {
        let mut hpf = prepared(48000.0);
        hpf.set_setting(HpfSetting::Hz80);

        let mut left = noise(0.5, 256);
        let mut right = vec![0.0; 256];
        process_stereo(&mut hpf, &mut left, &mut right);
        assert!(right.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_reset_gives_silence() {
        let mut hpf = prepared(48000.0);
        hpf.set_setting(HpfSetting::Hz160);
        assert_reset_gives_silence(&mut hpf);
    }
}
