//! Strip Parameters
//!
//! Lock-free parameter block shared between the control thread and the
//! audio thread.
//!
//! The control thread writes through the clamping setters; every value is
//! a single atomic store. The audio thread calls [`StripParameters::snapshot`]
//! once per block and processes the whole block with that copy, so a
//! parameter never changes halfway through a block.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use oxbow_dsp::coeffs::clamp_finite;
use oxbow_dsp::compressor::{MAKEUP_MAX_DB, MAKEUP_MIN_DB, THRESHOLD_MAX_DB, THRESHOLD_MIN_DB};
use oxbow_dsp::gain::{INPUT_GAIN_MAX_DB, INPUT_GAIN_MIN_DB, OUTPUT_TRIM_MAX_DB, OUTPUT_TRIM_MIN_DB};
use oxbow_dsp::limiter;
use oxbow_dsp::output::{OUTPUT_LEVEL_MAX_DB, OUTPUT_LEVEL_MIN_DB};
use oxbow_dsp::transformer::{DRIVE_MAX_PERCENT, DRIVE_MIN_PERCENT};
use oxbow_dsp::{Attack, BandKind, HpfSetting, Ratio, Release};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An `f32` stored as its bit pattern
///
/// Rust pattern: AtomicF32 doesn't exist, so we use bit-casting
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        // Relaxed ordering is fine for single-value updates
        // that don't need to synchronize with other memory operations
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Where the EQ sits relative to the compressor and limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EqPlacement {
    /// EQ -> Compressor -> Limiter
    #[default]
    PreDynamics,
    /// Compressor -> Limiter -> EQ
    PostDynamics,
}

impl EqPlacement {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => EqPlacement::PreDynamics,
            _ => EqPlacement::PostDynamics,
        }
    }

    fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Gain and frequency selector of one EQ band
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BandSettings {
    pub gain_db: f32,
    pub frequency_index: usize,
}

/// A plain copy of every strip parameter
///
/// Defaults match a freshly loaded strip: everything flat, LF selector on
/// 60 Hz, compressor and limiter switched out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSnapshot {
    pub master_bypass: bool,

    // Preamp
    pub input_gain_db: f32,
    pub phase_invert: bool,
    pub hpf_index: usize,
    pub drive_percent: f32,
    pub output_trim_db: f32,

    // EQ
    pub eq_bypass: bool,
    pub eq_placement: EqPlacement,
    pub lf: BandSettings,
    pub lm: BandSettings,
    pub hm: BandSettings,
    pub hf: BandSettings,

    // Compressor
    pub comp_bypass: bool,
    pub comp_threshold_db: f32,
    pub comp_ratio_index: usize,
    pub comp_attack_index: usize,
    pub comp_release_index: usize,
    pub comp_makeup_db: f32,
    pub comp_sidechain_hpf: bool,
    pub comp_stereo_link: bool,

    // Limiter
    pub limiter_bypass: bool,
    pub limiter_threshold_db: f32,

    // Output
    pub output_level_db: f32,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            master_bypass: false,
            input_gain_db: 0.0,
            phase_invert: false,
            hpf_index: HpfSetting::Off.index(),
            drive_percent: 0.0,
            output_trim_db: 0.0,
            eq_bypass: false,
            eq_placement: EqPlacement::PreDynamics,
            lf: BandSettings {
                gain_db: 0.0,
                frequency_index: 1,
            },
            lm: BandSettings::default(),
            hm: BandSettings::default(),
            hf: BandSettings::default(),
            comp_bypass: true,
            comp_threshold_db: -20.0,
            comp_ratio_index: Ratio::Three.index(),
            comp_attack_index: Attack::Medium.index(),
            comp_release_index: Release::Medium.index(),
            comp_makeup_db: 0.0,
            comp_sidechain_hpf: false,
            comp_stereo_link: true,
            limiter_bypass: true,
            limiter_threshold_db: 0.0,
            output_level_db: 0.0,
        }
    }
}

impl ParameterSnapshot {
    pub fn band(&self, kind: BandKind) -> BandSettings {
        match kind {
            BandKind::LowShelf => self.lf,
            BandKind::LowMid => self.lm,
            BandKind::HighMid => self.hm,
            BandKind::HighShelf => self.hf,
        }
    }
}

/// Atomic cells for one EQ band
#[derive(Debug)]
struct BandCells {
    gain_db: AtomicF32,
    frequency_index: AtomicU8,
}

impl BandCells {
    fn new(settings: BandSettings) -> Self {
        Self {
            gain_db: AtomicF32::new(settings.gain_db),
            frequency_index: AtomicU8::new(settings.frequency_index as u8),
        }
    }

    fn load(&self) -> BandSettings {
        BandSettings {
            gain_db: self.gain_db.load(),
            frequency_index: self.frequency_index.load(Ordering::Relaxed) as usize,
        }
    }
}

/// Shared parameter block, written by the control thread and read by the
/// audio thread
///
/// Every setter clamps before storing, so the audio thread only ever sees
/// in-range values.
#[derive(Debug)]
pub struct StripParameters {
    master_bypass: AtomicBool,

    input_gain_db: AtomicF32,
    phase_invert: AtomicBool,
    hpf_index: AtomicU8,
    drive_percent: AtomicF32,
    output_trim_db: AtomicF32,

    eq_bypass: AtomicBool,
    eq_placement: AtomicU8,
    /// Indexed in [`BandKind::ALL`] order
    bands: [BandCells; 4],

    comp_bypass: AtomicBool,
    comp_threshold_db: AtomicF32,
    comp_ratio_index: AtomicU8,
    comp_attack_index: AtomicU8,
    comp_release_index: AtomicU8,
    comp_makeup_db: AtomicF32,
    comp_sidechain_hpf: AtomicBool,
    comp_stereo_link: AtomicBool,

    limiter_bypass: AtomicBool,
    limiter_threshold_db: AtomicF32,

    output_level_db: AtomicF32,
}

impl Default for StripParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl StripParameters {
    pub fn new() -> Self {
        let defaults = ParameterSnapshot::default();
        let parameters = Self {
            master_bypass: AtomicBool::new(false),
            input_gain_db: AtomicF32::default(),
            phase_invert: AtomicBool::new(false),
            hpf_index: AtomicU8::new(0),
            drive_percent: AtomicF32::default(),
            output_trim_db: AtomicF32::default(),
            eq_bypass: AtomicBool::new(false),
            eq_placement: AtomicU8::new(EqPlacement::default().as_u8()),
            bands: BandKind::ALL.map(|kind| BandCells::new(defaults.band(kind))),
            comp_bypass: AtomicBool::new(true),
            comp_threshold_db: AtomicF32::default(),
            comp_ratio_index: AtomicU8::new(0),
            comp_attack_index: AtomicU8::new(0),
            comp_release_index: AtomicU8::new(0),
            comp_makeup_db: AtomicF32::default(),
            comp_sidechain_hpf: AtomicBool::new(false),
            comp_stereo_link: AtomicBool::new(true),
            limiter_bypass: AtomicBool::new(true),
            limiter_threshold_db: AtomicF32::default(),
            output_level_db: AtomicF32::default(),
        };
        parameters.apply(&defaults);
        parameters
    }

    // === Preamp ===

    pub fn set_master_bypass(&self, bypassed: bool) {
        self.master_bypass.store(bypassed, Ordering::Relaxed);
    }

    /// 0 to +60 dB
    pub fn set_input_gain_db(&self, gain_db: f32) {
        self.input_gain_db
            .store(clamp_finite(gain_db, INPUT_GAIN_MIN_DB, INPUT_GAIN_MAX_DB));
    }

    pub fn set_phase_invert(&self, inverted: bool) {
        self.phase_invert.store(inverted, Ordering::Relaxed);
    }

    /// 0 = Off, 1-4 = 50/80/160/300 Hz
    pub fn set_hpf_index(&self, index: usize) {
        let index = HpfSetting::from_index(index).index();
        self.hpf_index.store(index as u8, Ordering::Relaxed);
    }

    /// 0 to 100 %
    pub fn set_drive_percent(&self, drive_percent: f32) {
        self.drive_percent
            .store(clamp_finite(drive_percent, DRIVE_MIN_PERCENT, DRIVE_MAX_PERCENT));
    }

    /// -20 to +10 dB
    pub fn set_output_trim_db(&self, trim_db: f32) {
        self.output_trim_db
            .store(clamp_finite(trim_db, OUTPUT_TRIM_MIN_DB, OUTPUT_TRIM_MAX_DB));
    }

    // === EQ ===

    pub fn set_eq_bypass(&self, bypassed: bool) {
        self.eq_bypass.store(bypassed, Ordering::Relaxed);
    }

    pub fn set_eq_placement(&self, placement: EqPlacement) {
        let previous = self.eq_placement.swap(placement.as_u8(), Ordering::Relaxed);
        if previous != placement.as_u8() {
            debug!("EQ placement changed to {:?}", placement);
        }
    }

    /// Clamped to ±16 dB (±12 dB for the HM bell)
    pub fn set_band_gain_db(&self, kind: BandKind, gain_db: f32) {
        let limit = kind.gain_limit_db();
        self.bands[kind as usize]
            .gain_db
            .store(clamp_finite(gain_db, -limit, limit));
    }

    /// Clamped to the band's frequency table
    pub fn set_band_frequency_index(&self, kind: BandKind, index: usize) {
        let index = index.min(kind.frequencies().len() - 1);
        self.bands[kind as usize]
            .frequency_index
            .store(index as u8, Ordering::Relaxed);
    }

    // === Compressor ===

    pub fn set_comp_bypass(&self, bypassed: bool) {
        self.comp_bypass.store(bypassed, Ordering::Relaxed);
    }

    /// -40 to +10 dB
    pub fn set_comp_threshold_db(&self, threshold_db: f32) {
        self.comp_threshold_db
            .store(clamp_finite(threshold_db, THRESHOLD_MIN_DB, THRESHOLD_MAX_DB));
    }

    /// 0-4 = 1.5:1, 2:1, 3:1, 4:1, 6:1
    pub fn set_comp_ratio_index(&self, index: usize) {
        let index = Ratio::from_index(index).index();
        self.comp_ratio_index.store(index as u8, Ordering::Relaxed);
    }

    /// 0-2 = 2, 8, 20 ms
    pub fn set_comp_attack_index(&self, index: usize) {
        let index = Attack::from_index(index).index();
        self.comp_attack_index.store(index as u8, Ordering::Relaxed);
    }

    /// 0-2 = 100, 400, 1200 ms; 3 = Auto
    pub fn set_comp_release_index(&self, index: usize) {
        let index = Release::from_index(index).index();
        self.comp_release_index.store(index as u8, Ordering::Relaxed);
    }

    /// 0 to +20 dB
    pub fn set_comp_makeup_db(&self, makeup_db: f32) {
        self.comp_makeup_db
            .store(clamp_finite(makeup_db, MAKEUP_MIN_DB, MAKEUP_MAX_DB));
    }

    pub fn set_comp_sidechain_hpf(&self, enabled: bool) {
        self.comp_sidechain_hpf.store(enabled, Ordering::Relaxed);
    }

    pub fn set_comp_stereo_link(&self, linked: bool) {
        self.comp_stereo_link.store(linked, Ordering::Relaxed);
    }

    // === Limiter / Output ===

    pub fn set_limiter_bypass(&self, bypassed: bool) {
        self.limiter_bypass.store(bypassed, Ordering::Relaxed);
    }

    /// -20 to 0 dB
    pub fn set_limiter_threshold_db(&self, threshold_db: f32) {
        self.limiter_threshold_db.store(clamp_finite(
            threshold_db,
            limiter::THRESHOLD_MIN_DB,
            limiter::THRESHOLD_MAX_DB,
        ));
    }

    /// -20 to +10 dB
    pub fn set_output_level_db(&self, level_db: f32) {
        self.output_level_db
            .store(clamp_finite(level_db, OUTPUT_LEVEL_MIN_DB, OUTPUT_LEVEL_MAX_DB));
    }

    /// Copy every parameter out in one go
    ///
    /// # Real-time Safety
    /// Only relaxed atomic loads; safe to call from the audio callback.
    pub fn snapshot(&self) -> ParameterSnapshot {
        let [lf, lm, hm, hf] = &self.bands;
        ParameterSnapshot {
            master_bypass: self.master_bypass.load(Ordering::Relaxed),
            input_gain_db: self.input_gain_db.load(),
            phase_invert: self.phase_invert.load(Ordering::Relaxed),
            hpf_index: self.hpf_index.load(Ordering::Relaxed) as usize,
            drive_percent: self.drive_percent.load(),
            output_trim_db: self.output_trim_db.load(),
            eq_bypass: self.eq_bypass.load(Ordering::Relaxed),
            eq_placement: EqPlacement::from_u8(self.eq_placement.load(Ordering::Relaxed)),
            lf: lf.load(),
            lm: lm.load(),
            hm: hm.load(),
            hf: hf.load(),
            comp_bypass: self.comp_bypass.load(Ordering::Relaxed),
            comp_threshold_db: self.comp_threshold_db.load(),
            comp_ratio_index: self.comp_ratio_index.load(Ordering::Relaxed) as usize,
            comp_attack_index: self.comp_attack_index.load(Ordering::Relaxed) as usize,
            comp_release_index: self.comp_release_index.load(Ordering::Relaxed) as usize,
            comp_makeup_db: self.comp_makeup_db.load(),
            comp_sidechain_hpf: self.comp_sidechain_hpf.load(Ordering::Relaxed),
            comp_stereo_link: self.comp_stereo_link.load(Ordering::Relaxed),
            limiter_bypass: self.limiter_bypass.load(Ordering::Relaxed),
            limiter_threshold_db: self.limiter_threshold_db.load(),
            output_level_db: self.output_level_db.load(),
        }
    }

    /// Store every value of a snapshot through the clamping setters
    pub fn apply(&self, snapshot: &ParameterSnapshot) {
        self.set_master_bypass(snapshot.master_bypass);
        self.set_input_gain_db(snapshot.input_gain_db);
        self.set_phase_invert(snapshot.phase_invert);
        self.set_hpf_index(snapshot.hpf_index);
        self.set_drive_percent(snapshot.drive_percent);
        self.set_output_trim_db(snapshot.output_trim_db);

        self.set_eq_bypass(snapshot.eq_bypass);
        self.set_eq_placement(snapshot.eq_placement);
        for kind in BandKind::ALL {
            let band = snapshot.band(kind);
            self.set_band_gain_db(kind, band.gain_db);
            self.set_band_frequency_index(kind, band.frequency_index);
        }

        self.set_comp_bypass(snapshot.comp_bypass);
        self.set_comp_threshold_db(snapshot.comp_threshold_db);
        self.set_comp_ratio_index(snapshot.comp_ratio_index);
        self.set_comp_attack_index(snapshot.comp_attack_index);
        self.set_comp_release_index(snapshot.comp_release_index);
        self.set_comp_makeup_db(snapshot.comp_makeup_db);
        self.set_comp_sidechain_hpf(snapshot.comp_sidechain_hpf);
        self.set_comp_stereo_link(snapshot.comp_stereo_link);

        self.set_limiter_bypass(snapshot.limiter_bypass);
        self.set_limiter_threshold_db(snapshot.limiter_threshold_db);
        self.set_output_level_db(snapshot.output_level_db);
    }
}
