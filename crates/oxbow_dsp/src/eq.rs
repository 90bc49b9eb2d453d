//! 4-Band Console Equalizer
//!
//! Two shelves and two bells with stepped frequency selectors:
//!
//! | Band | Type       | Frequencies                  | Gain   | Q             |
//! |------|------------|------------------------------|--------|---------------|
//! | LF   | Low shelf  | 35, 60, 110, 220 Hz          | ±16 dB | 0.5           |
//! | LM   | Bell       | 220, 360, 700, 1600, 3200 Hz | ±16 dB | 0.8, prop.    |
//! | HM   | Bell       | 1.5, 2.4, 3.2, 4.8, 7.2 kHz  | ±12 dB | 1.0, prop.    |
//! | HF   | High shelf | 10, 12, 16 kHz               | ±16 dB | 0.6           |
//!
//! The bells use proportional Q: the more gain, the narrower the bell.
//! A band within 0.1 dB of flat is neutral and skipped entirely.

use crate::block::AudioBlock;
use crate::coeffs::{self, FilterCoefficients};
use crate::filter::ChannelFilters;
use crate::processor::{AudioProcessor, ProcessContext, StageMode};

pub const LF_FREQUENCIES: [f32; 4] = [35.0, 60.0, 110.0, 220.0];
pub const LM_FREQUENCIES: [f32; 5] = [220.0, 360.0, 700.0, 1600.0, 3200.0];
pub const HM_FREQUENCIES: [f32; 5] = [1500.0, 2400.0, 3200.0, 4800.0, 7200.0];
pub const HF_FREQUENCIES: [f32; 3] = [10000.0, 12000.0, 16000.0];

/// Gains closer to 0 dB than this leave a band neutral
pub const NEUTRAL_GAIN_DB: f32 = 0.1;

/// Below this much gain a bell keeps its base Q
const PROPORTIONAL_Q_ONSET_DB: f32 = 0.5;

/// Q multiplier reached at 16 dB of gain is 1 + this
const PROPORTIONAL_Q_SPREAD: f32 = 1.5;

/// The four bands, listed in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    LowShelf,
    LowMid,
    HighMid,
    HighShelf,
}

impl BandKind {
    /// Processing order: LF -> LM -> HM -> HF
    pub const ALL: [BandKind; 4] = [
        BandKind::LowShelf,
        BandKind::LowMid,
        BandKind::HighMid,
        BandKind::HighShelf,
    ];

    /// Selectable frequencies for this band
    pub fn frequencies(self) -> &'static [f32] {
        match self {
            BandKind::LowShelf => &LF_FREQUENCIES,
            BandKind::LowMid => &LM_FREQUENCIES,
            BandKind::HighMid => &HM_FREQUENCIES,
            BandKind::HighShelf => &HF_FREQUENCIES,
        }
    }

    /// Symmetric boost/cut limit in dB
    pub fn gain_limit_db(self) -> f32 {
        match self {
            BandKind::HighMid => 12.0,
            _ => 16.0,
        }
    }

    /// Q at (or near) 0 dB of gain
    pub fn base_q(self) -> f32 {
        match self {
            BandKind::LowShelf => 0.5,
            BandKind::LowMid => 0.8,
            BandKind::HighMid => 1.0,
            BandKind::HighShelf => 0.6,
        }
    }

    pub fn is_bell(self) -> bool {
        matches!(self, BandKind::LowMid | BandKind::HighMid)
    }

    fn position(self) -> usize {
        self as usize
    }
}

/// Bell Q that narrows as gain rises
///
/// `base_q * (1 + |gain|/16 * 1.5)` once the gain reaches 0.5 dB,
/// `base_q` below that.
pub fn proportional_q(gain_db: f32, base_q: f32) -> f32 {
    let abs_gain = gain_db.abs();
    if abs_gain < PROPORTIONAL_Q_ONSET_DB {
        return base_q;
    }
    base_q * (1.0 + (abs_gain / 16.0) * PROPORTIONAL_Q_SPREAD)
}

/// One EQ band with per-channel filter state
#[derive(Debug, Clone, Copy)]
pub struct EqBand {
    kind: BandKind,
    frequency_index: usize,
    gain_db: f32,
    sample_rate: f32,
    filters: ChannelFilters,
}

impl EqBand {
    pub fn new(kind: BandKind, sample_rate: f32) -> Self {
        Self {
            kind,
            frequency_index: 0,
            gain_db: 0.0,
            sample_rate,
            filters: ChannelFilters::pass_through(),
        }
    }

    pub fn kind(&self) -> BandKind {
        self.kind
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn frequency_index(&self) -> usize {
        self.frequency_index
    }

    /// Centre (bells) or corner (shelves) frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.kind.frequencies()[self.frequency_index]
    }

    /// Effective Q for the current gain
    pub fn q(&self) -> f32 {
        if self.kind.is_bell() {
            proportional_q(self.gain_db, self.kind.base_q())
        } else {
            self.kind.base_q()
        }
    }

    pub fn coefficients(&self) -> FilterCoefficients {
        self.filters.coefficients()
    }

    /// Band sits within 0.1 dB of flat
    #[inline]
    pub fn is_neutral(&self) -> bool {
        self.gain_db.abs() < NEUTRAL_GAIN_DB
    }

    /// Gain is clamped to the band's limit
    pub fn set_gain_db(&mut self, gain_db: f32) {
        let limit = self.kind.gain_limit_db();
        let gain_db = coeffs::clamp_finite(gain_db, -limit, limit);
        if gain_db == self.gain_db {
            return;
        }
        self.gain_db = gain_db;
        self.update_coefficients();
    }

    /// Frequency selector position, clamped to the band's table
    pub fn set_frequency_index(&mut self, index: usize) {
        let index = index.min(self.kind.frequencies().len() - 1);
        if index == self.frequency_index {
            return;
        }
        self.frequency_index = index;
        self.update_coefficients();
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        let coefficients = if self.is_neutral() {
            coeffs::identity()
        } else {
            let freq = self.frequency();
            let q = self.q();
            match self.kind {
                BandKind::LowShelf => coeffs::low_shelf(freq, self.gain_db, q, self.sample_rate),
                BandKind::HighShelf => coeffs::high_shelf(freq, self.gain_db, q, self.sample_rate),
                BandKind::LowMid | BandKind::HighMid => {
                    coeffs::peaking(freq, self.gain_db, q, self.sample_rate)
                }
            }
        };
        self.filters.set_coefficients(coefficients);
    }

    #[inline]
    fn run(&mut self, channel: usize, sample: f32) -> f32 {
        self.filters.run(channel, sample)
    }

    fn reset(&mut self) {
        self.filters.reset();
    }
}

/// The full equalizer section
#[derive(Debug, Clone)]
pub struct Equalizer {
    /// Stored in processing order, see [`BandKind::ALL`]
    bands: [EqBand; 4],
    bypassed: bool,
}

impl Equalizer {
    /// Flat EQ, every band at its first frequency
    pub fn new(sample_rate: f32) -> Self {
        // `array::map` builds the fixed-size band array without a Vec
        let bands = BandKind::ALL.map(|kind| EqBand::new(kind, sample_rate));
        Self {
            bands,
            bypassed: false,
        }
    }

    pub fn set_bypass(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    pub fn set_band_gain(&mut self, kind: BandKind, gain_db: f32) {
        self.bands[kind.position()].set_gain_db(gain_db);
    }

    pub fn set_band_frequency(&mut self, kind: BandKind, index: usize) {
        self.bands[kind.position()].set_frequency_index(index);
    }

    pub fn band(&self, kind: BandKind) -> &EqBand {
        &self.bands[kind.position()]
    }

    /// Every band is within 0.1 dB of flat
    pub fn is_flat(&self) -> bool {
        self.bands.iter().all(EqBand::is_neutral)
    }
}

impl AudioProcessor for Equalizer {
    fn prepare(&mut self, context: &ProcessContext) {
        for band in &mut self.bands {
            band.set_sample_rate(context.sample_rate);
        }
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBlock<'_>) {
        if self.bypassed || self.is_flat() {
            return;
        }

        // Neutral bands are skipped, their state stays frozen
        let active: [bool; 4] = core::array::from_fn(|i| !self.bands[i].is_neutral());

        for (ch, channel) in block.channels_mut().enumerate() {
            for sample in channel.iter_mut() {
                let mut s = *sample;
                for (band, _) in self.bands.iter_mut().zip(active).filter(|(_, on)| *on) {
                    s = band.run(ch, s);
                }
                *sample = s;
            }
        }
    }

    fn reset(&mut self) {
        for band in &mut self.bands {
            band.reset();
        }
    }

    fn name(&self) -> &'static str {
        "Equalizer"
    }

    fn mode(&self) -> StageMode {
        if self.bypassed {
            StageMode::Bypassed
        } else if self.is_flat() {
            StageMode::Neutral
        } else {
            StageMode::Active
        }
    }
}
