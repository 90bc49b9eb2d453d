//! Oxbow DSP - Console Channel Strip Stages
//!
//! This crate provides every per-sample stage of the Oxbow strip:
//! - Smoothed input gain, polarity and output trim
//! - Stepped 2-pole high-pass filter
//! - Transformer saturation with LF weight and HF silk
//! - 4-band equalizer with proportional-Q bells
//! - Soft-knee compressor with program-dependent release
//! - Safety limiter with soft clip
//! - Smoothed output level
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Coefficients are derived in `prepare()` and in parameter setters, never
//! inside `process()`. Every stage works in place on an [`AudioBlock`].

mod block;
pub mod coeffs;
pub mod compressor;
pub mod eq;
mod error;
mod filter;
pub mod gain;
pub mod hpf;
pub mod limiter;
pub mod output;
mod processor;
mod saturation;
pub mod transformer;

pub use block::{AudioBlock, MAX_CHANNELS};
pub use coeffs::FilterCoefficients;
pub use compressor::{
    compute_gain, gain_reduction_db, Attack, Compressor, EnvelopeState, Ratio, Release,
    ATTACK_TIMES_MS, KNEE_WIDTH_DB, RATIOS, RELEASE_TIMES_MS,
};
pub use eq::{
    proportional_q, BandKind, EqBand, Equalizer, HF_FREQUENCIES, HM_FREQUENCIES, LF_FREQUENCIES,
    LM_FREQUENCIES,
};
pub use error::DspError;
pub use filter::{ChannelFilters, FilterState};
pub use gain::{GainStage, SmoothedGain, SMOOTHING_TIME_MS};
pub use hpf::{HighPassFilter, HpfSetting, HPF_FREQUENCIES};
pub use limiter::{limiter_gain, Limiter};
pub use output::OutputStage;
pub use processor::{AudioProcessor, ProcessContext, StageMode};
pub use saturation::{safety_clip, transformer_curve};
pub use transformer::Transformer;
