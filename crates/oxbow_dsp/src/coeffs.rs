//! Coefficient Math
//!
//! Pure conversions from user-facing units (dB, Hz, Q, ms) into filter
//! coefficients. Biquad designs are the RBJ (Robert Bristow-Johnson)
//! Audio EQ Cookbook formulas provided by the `biquad` crate.
//!
//! Everything here is called on parameter change, never per sample.

use std::f32::consts::PI;

use biquad::{Coefficients, ToHertz, Type};

use crate::error::DspError;

/// Second-order section coefficients, normalized so that a0 = 1
pub type FilterCoefficients = Coefficients<f32>;

/// Level reported for silence by [`linear_to_db`]
pub const SILENCE_DB: f32 = -100.0;

/// Butterworth Q for a 2-pole section (flat passband)
pub const Q_BUTTERWORTH: f32 = 0.707;

/// Convert decibels to linear amplitude: 10^(dB/20)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels, flooring silence at [`SILENCE_DB`]
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 0.0 {
        20.0 * linear.log10()
    } else {
        SILENCE_DB
    }
}

/// One-pole smoothing coefficient for a time constant in milliseconds
///
/// Returns 1.0 (instant response) for non-positive time constants.
#[inline]
pub fn one_pole_coefficient(sample_rate: f32, time_ms: f32) -> f32 {
    if time_ms <= 0.0 {
        return 1.0;
    }
    1.0 - (-1.0 / (sample_rate * time_ms * 0.001)).exp()
}

/// Low-pass smoothing coefficient of a one-pole filter with corner `freq`
#[inline]
pub fn one_pole_lowpass_coefficient(freq: f32, sample_rate: f32) -> f32 {
    1.0 - one_pole_pole(freq, sample_rate)
}

/// Pole position e^(-2*pi*f/fs) of a one-pole filter with corner `freq`
#[inline]
pub fn one_pole_pole(freq: f32, sample_rate: f32) -> f32 {
    (-2.0 * PI * freq / sample_rate).exp()
}

/// Clamp into range; NaN falls back to the lower bound
#[inline]
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Move `current` a fraction `coeff` of the way towards `target`
#[inline]
pub fn smooth_towards(current: f32, target: f32, coeff: f32) -> f32 {
    current + coeff * (target - current)
}

/// Pass-through coefficients (b0 = 1, everything else 0)
pub fn identity() -> FilterCoefficients {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

/// Highest corner, as a fraction of the sample rate, a design will accept
const MAX_CORNER_RATIO: f32 = 0.49;

/// Cookbook design through the `biquad` crate
///
/// Corners at or above Nyquist are pulled just below it first, so only a
/// negative Q or a non-positive or non-finite corner can still be rejected.
pub fn design(
    filter: Type<f32>,
    freq: f32,
    q: f32,
    sample_rate: f32,
) -> Result<FilterCoefficients, DspError> {
    let invalid = DspError::InvalidCoefficients {
        frequency: freq,
        sample_rate,
    };
    if !(freq > 0.0 && freq.is_finite()) {
        return Err(invalid);
    }
    let corner = freq.min(sample_rate * MAX_CORNER_RATIO);

    // Rust pattern: map the foreign error into our own enum at the boundary
    Coefficients::<f32>::from_params(filter, sample_rate.hz(), corner.hz(), q)
        .ok()
        .filter(|c| [c.b0, c.b1, c.b2, c.a1, c.a2].iter().all(|v| v.is_finite()))
        .ok_or(invalid)
}

/// Infallible wrapper for the stage setters: a rejected design passes audio through
#[inline]
fn design_or_identity(filter: Type<f32>, freq: f32, q: f32, sample_rate: f32) -> FilterCoefficients {
    design(filter, freq, q, sample_rate).unwrap_or_else(|_| identity())
}

/// Low shelf: boosts/cuts everything below `freq` by `gain_db`
pub fn low_shelf(freq: f32, gain_db: f32, q: f32, sample_rate: f32) -> FilterCoefficients {
    design_or_identity(Type::LowShelf(gain_db), freq, q, sample_rate)
}

/// High shelf: boosts/cuts everything above `freq` by `gain_db`
pub fn high_shelf(freq: f32, gain_db: f32, q: f32, sample_rate: f32) -> FilterCoefficients {
    design_or_identity(Type::HighShelf(gain_db), freq, q, sample_rate)
}

/// Peaking (bell) filter centred on `freq`
pub fn peaking(freq: f32, gain_db: f32, q: f32, sample_rate: f32) -> FilterCoefficients {
    design_or_identity(Type::PeakingEQ(gain_db), freq, q, sample_rate)
}

/// 2-pole high-pass with corner `freq`
pub fn high_pass(freq: f32, q: f32, sample_rate: f32) -> FilterCoefficients {
    design_or_identity(Type::HighPass, freq, q, sample_rate)
}

/// Magnitude response of a section at `freq`, used by tests and meters
pub fn magnitude_at(coeffs: &FilterCoefficients, freq: f32, sample_rate: f32) -> f32 {
    let w = 2.0 * PI * freq / sample_rate;
    let (cos1, sin1) = (w.cos(), w.sin());
    let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

    let num_re = coeffs.b0 + coeffs.b1 * cos1 + coeffs.b2 * cos2;
    let num_im = -(coeffs.b1 * sin1 + coeffs.b2 * sin2);
    let den_re = 1.0 + coeffs.a1 * cos1 + coeffs.a2 * cos2;
    let den_im = -(coeffs.a1 * sin1 + coeffs.a2 * sin2);

    ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
}
