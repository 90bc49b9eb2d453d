//! Diode-Bridge Style Compressor
//!
//! Feed-forward peak compressor with a 6dB soft knee, stepped ratio,
//! attack and release selectors, and a program-dependent "Auto" release.
//!
//! Signal flow per sample:
//!
//! ```text
//! input ─┬───────────────────────────────────────────► × gain × makeup ─► output
//!        └► [sidechain HPF] ─► |x| ─► envelope ─► compute_gain ─┘
//! ```
//!
//! With stereo link on, the louder of the two channels drives a single
//! envelope and both channels receive the same gain.

use crate::block::{AudioBlock, MAX_CHANNELS};
use crate::coeffs::{
    clamp_finite, db_to_linear, linear_to_db, one_pole_coefficient, one_pole_pole,
};
use crate::processor::{AudioProcessor, ProcessContext, StageMode};

pub const RATIOS: [f32; 5] = [1.5, 2.0, 3.0, 4.0, 6.0];
pub const ATTACK_TIMES_MS: [f32; 3] = [2.0, 8.0, 20.0];
pub const RELEASE_TIMES_MS: [f32; 3] = [100.0, 400.0, 1200.0];

pub const THRESHOLD_MIN_DB: f32 = -40.0;
pub const THRESHOLD_MAX_DB: f32 = 10.0;
pub const MAKEUP_MIN_DB: f32 = 0.0;
pub const MAKEUP_MAX_DB: f32 = 20.0;

/// Width of the soft knee above threshold
pub const KNEE_WIDTH_DB: f32 = 6.0;

/// Share of the full-ratio reduction reached at the top of the knee
const KNEE_DEPTH: f32 = 0.25;

/// Sidechain high-pass corner, keeps bass from pumping the detector
const SIDECHAIN_HPF_HZ: f32 = 150.0;

const AUTO_RELEASE_FAST_MS: f32 = 50.0;
const AUTO_RELEASE_SLOW_MS: f32 = 800.0;

/// Program-level tracker chase rates for Auto release
const PROGRAM_RISE: f32 = 0.001;
const PROGRAM_FALL: f32 = 0.0001;
const PROGRAM_DENSITY_SCALE: f32 = 10.0;

/// Compression ratio selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ratio {
    OnePointFive,
    Two,
    #[default]
    Three,
    Four,
    Six,
}

impl Ratio {
    pub const ALL: [Ratio; 5] = [Ratio::OnePointFive, Ratio::Two, Ratio::Three, Ratio::Four, Ratio::Six];

    /// Out-of-range indices clamp to 6:1
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn value(self) -> f32 {
        RATIOS[self.index()]
    }
}

/// Attack time selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attack {
    Fast,
    #[default]
    Medium,
    Slow,
}

impl Attack {
    pub const ALL: [Attack; 3] = [Attack::Fast, Attack::Medium, Attack::Slow];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn time_ms(self) -> f32 {
        ATTACK_TIMES_MS[self.index()]
    }
}

/// Release time selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Release {
    Fast,
    #[default]
    Medium,
    Slow,
    /// Program dependent: fast on transients, slow on dense material
    Auto,
}

impl Release {
    pub const ALL: [Release; 4] = [Release::Fast, Release::Medium, Release::Slow, Release::Auto];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Fixed release time, `None` for Auto
    pub fn time_ms(self) -> Option<f32> {
        match self {
            Release::Auto => None,
            fixed => Some(RELEASE_TIMES_MS[fixed.index()]),
        }
    }
}

/// Release smoothing, resolved for the current sample rate
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReleaseCoefficients {
    Fixed(f32),
    Auto { fast: f32, slow: f32 },
}

/// Detector state for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvelopeState {
    /// Smoothed detector level (linear)
    pub level: f32,
    /// Slow program-level tracker driving Auto release
    pub program: f32,
}

impl EnvelopeState {
    /// How dense the program is, 0.0 (sparse) to 1.0 (sustained)
    #[inline]
    pub fn density(&self) -> f32 {
        (self.program * PROGRAM_DENSITY_SCALE).min(1.0)
    }

    #[inline]
    fn track_program(&mut self, target: f32) {
        let rate = if target > self.program {
            PROGRAM_RISE
        } else {
            PROGRAM_FALL
        };
        self.program += rate * (target - self.program);
    }

    #[inline]
    fn follow(&mut self, target: f32, attack: f32, release: f32) {
        let coeff = if target > self.level { attack } else { release };
        self.level += coeff * (target - self.level);
    }
}

/// Gain reduction in dB for a detector level `level_db`
///
/// Zero below threshold. Inside the 6dB knee the ratio fades in as
/// `1 + (ratio - 1) * k²`, scaled so the curve meets the full-ratio line
/// at the top of the knee; above it the nominal ratio applies on top of
/// the knee's `6 * (1 - 1/ratio) * 0.25` dB.
#[inline]
pub fn gain_reduction_db(level_db: f32, threshold_db: f32, ratio: f32) -> f32 {
    let over = level_db - threshold_db;
    if over <= 0.0 {
        return 0.0;
    }

    let slope = 1.0 - 1.0 / ratio;
    if over < KNEE_WIDTH_DB {
        let k = over / KNEE_WIDTH_DB;
        let effective_ratio = 1.0 + (ratio - 1.0) * k * k;
        KNEE_DEPTH * over * (1.0 - 1.0 / effective_ratio)
    } else {
        KNEE_WIDTH_DB * slope * KNEE_DEPTH + (over - KNEE_WIDTH_DB) * slope
    }
}

/// Linear gain for a linear detector level; exactly 1.0 below threshold
#[inline]
pub fn compute_gain(level: f32, threshold_db: f32, ratio: f32) -> f32 {
    reduction_to_gain(gain_reduction_db(linear_to_db(level), threshold_db, ratio))
}

#[inline]
fn reduction_to_gain(reduction_db: f32) -> f32 {
    if reduction_db == 0.0 {
        1.0
    } else {
        db_to_linear(-reduction_db)
    }
}

/// Channel compressor
#[derive(Debug, Clone)]
pub struct Compressor {
    sample_rate: f32,
    threshold_db: f32,
    ratio: Ratio,
    attack: Attack,
    release: Release,
    makeup_db: f32,
    makeup: f32,
    sidechain_hpf: bool,
    stereo_link: bool,
    bypassed: bool,

    attack_coeff: f32,
    release_coeffs: ReleaseCoefficients,
    sidechain_pole: f32,

    envelopes: [EnvelopeState; MAX_CHANNELS],
    sidechain_state: [f32; MAX_CHANNELS],
    gain_reduction_db: f32,
}

impl Compressor {
    /// -20 dB threshold, 3:1, medium attack and release, linked
    pub fn new(sample_rate: f32) -> Self {
        let mut compressor = Self {
            sample_rate,
            threshold_db: -20.0,
            ratio: Ratio::default(),
            attack: Attack::default(),
            release: Release::default(),
            makeup_db: 0.0,
            makeup: 1.0,
            sidechain_hpf: false,
            stereo_link: true,
            bypassed: false,
            attack_coeff: 1.0,
            release_coeffs: ReleaseCoefficients::Fixed(1.0),
            sidechain_pole: 0.0,
            envelopes: [EnvelopeState::default(); MAX_CHANNELS],
            sidechain_state: [0.0; MAX_CHANNELS],
            gain_reduction_db: 0.0,
        };
        compressor.update_coefficients();
        compressor
    }

    /// -40 to +10 dB
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = clamp_finite(threshold_db, THRESHOLD_MIN_DB, THRESHOLD_MAX_DB);
    }

    pub fn set_ratio(&mut self, ratio: Ratio) {
        self.ratio = ratio;
    }

    pub fn set_attack(&mut self, attack: Attack) {
        if attack != self.attack {
            self.attack = attack;
            self.update_coefficients();
        }
    }

    pub fn set_release(&mut self, release: Release) {
        if release != self.release {
            self.release = release;
            self.update_coefficients();
        }
    }

    /// 0 to +20 dB, applied after the compression gain
    pub fn set_makeup_db(&mut self, makeup_db: f32) {
        self.makeup_db = clamp_finite(makeup_db, MAKEUP_MIN_DB, MAKEUP_MAX_DB);
        self.makeup = db_to_linear(self.makeup_db);
    }

    pub fn set_sidechain_hpf(&mut self, enabled: bool) {
        self.sidechain_hpf = enabled;
    }

    pub fn set_stereo_link(&mut self, linked: bool) {
        self.stereo_link = linked;
    }

    pub fn set_bypass(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    pub fn attack(&self) -> Attack {
        self.attack
    }

    pub fn release(&self) -> Release {
        self.release
    }

    pub fn makeup_db(&self) -> f32 {
        self.makeup_db
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Largest reduction applied during the last block, in dB (positive)
    pub fn gain_reduction(&self) -> f32 {
        self.gain_reduction_db
    }

    /// Detector state of a channel; when linked only channel 0 is used
    pub fn envelope(&self, channel: usize) -> EnvelopeState {
        self.envelopes[channel.min(MAX_CHANNELS - 1)]
    }

    fn update_coefficients(&mut self) {
        self.attack_coeff = one_pole_coefficient(self.sample_rate, self.attack.time_ms());
        self.release_coeffs = match self.release.time_ms() {
            Some(ms) => ReleaseCoefficients::Fixed(one_pole_coefficient(self.sample_rate, ms)),
            None => ReleaseCoefficients::Auto {
                fast: one_pole_coefficient(self.sample_rate, AUTO_RELEASE_FAST_MS),
                slow: one_pole_coefficient(self.sample_rate, AUTO_RELEASE_SLOW_MS),
            },
        };
        self.sidechain_pole = one_pole_pole(SIDECHAIN_HPF_HZ, self.sample_rate);
    }

    /// Sidechain tap of one channel, high-passed if enabled
    #[inline]
    fn sidechain(&mut self, channel: usize, sample: f32) -> f32 {
        if !self.sidechain_hpf {
            return sample;
        }
        let state = &mut self.sidechain_state[channel];
        let high = sample - *state;
        *state += (1.0 - self.sidechain_pole) * high;
        high
    }

    /// Advance one channel's envelope towards `target` and return the
    /// reduction in dB for the new level
    #[inline]
    fn detect(&mut self, channel: usize, target: f32) -> f32 {
        let envelope = &mut self.envelopes[channel];
        let release = match self.release_coeffs {
            ReleaseCoefficients::Fixed(coeff) => coeff,
            ReleaseCoefficients::Auto { fast, slow } => {
                envelope.track_program(target);
                let density = envelope.density();
                fast * (1.0 - density) + slow * density
            }
        };
        envelope.follow(target, self.attack_coeff, release);

        gain_reduction_db(linear_to_db(envelope.level), self.threshold_db, self.ratio.value())
    }
}

impl AudioProcessor for Compressor {
    fn prepare(&mut self, context: &ProcessContext) {
        self.sample_rate = context.sample_rate;
        self.update_coefficients();
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBlock<'_>) {
        if self.bypassed {
            return;
        }

        let makeup = self.makeup;
        let mut max_reduction = 0.0_f32;
        let (left, right) = block.split_mut();

        match right {
            Some(right) if self.stereo_link => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    let sc_l = self.sidechain(0, *l).abs();
                    let sc_r = self.sidechain(1, *r).abs();
                    let reduction = self.detect(0, sc_l.max(sc_r));
                    max_reduction = max_reduction.max(reduction);

                    let gain = reduction_to_gain(reduction) * makeup;
                    *l *= gain;
                    *r *= gain;
                }
            }
            Some(right) => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    let sc_l = self.sidechain(0, *l).abs();
                    let sc_r = self.sidechain(1, *r).abs();
                    let reduction_l = self.detect(0, sc_l);
                    let reduction_r = self.detect(1, sc_r);
                    max_reduction = max_reduction.max(reduction_l).max(reduction_r);

                    *l *= reduction_to_gain(reduction_l) * makeup;
                    *r *= reduction_to_gain(reduction_r) * makeup;
                }
            }
            None => {
                for sample in left.iter_mut() {
                    let sc = self.sidechain(0, *sample).abs();
                    let reduction = self.detect(0, sc);
                    max_reduction = max_reduction.max(reduction);
                    *sample *= reduction_to_gain(reduction) * makeup;
                }
            }
        }

        self.gain_reduction_db = max_reduction;
    }

    fn reset(&mut self) {
        self.envelopes = [EnvelopeState::default(); MAX_CHANNELS];
        self.sidechain_state = [0.0; MAX_CHANNELS];
        self.gain_reduction_db = 0.0;
    }

    fn name(&self) -> &'static str {
        "Compressor"
    }

    fn mode(&self) -> StageMode {
        if self.bypassed {
            StageMode::Bypassed
        } else {
            StageMode::Active
        }
    }
}
