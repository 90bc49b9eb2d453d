//! Saturation Curves
//!
//! Memoryless waveshapers shared by the transformer and the limiter.
//!
//! - [`transformer_curve`]: asymmetric tanh saturation. A small quadratic
//!   bias makes positive and negative half-cycles saturate differently,
//!   which generates even-order harmonics.
//! - [`safety_clip`]: tanh soft clip used as the last line of defence in
//!   the limiter.

/// Amount of quadratic bias per unit of drive
const ASYMMETRY: f32 = 0.15;

/// Extra steepness of the negative half-cycle, relative to the positive one
const NEGATIVE_SLOPE: f32 = 0.8;

/// Share of the saturated signal that is blended in regardless of drive
const FIXED_WET: f32 = 0.3;

/// Share of the saturated signal that scales with drive
const DRIVE_WET: f32 = 0.7;

/// Samples above this multiple of the threshold are soft clipped
pub const SAFETY_CLIP_RATIO: f32 = 1.1;

/// Transformer saturation of a single sample
///
/// * `drive` - normalized drive, 0.0 to 1.0
/// * `drive_gain` - pre-saturation gain derived from the drive (1.0 to 4.0)
///
/// The saturated signal is normalized by `drive_gain` and blended with the
/// dry input.
#[inline]
pub fn transformer_curve(input: f32, drive: f32, drive_gain: f32) -> f32 {
    let driven = input * drive_gain;

    let biased = driven + ASYMMETRY * drive * driven * driven;

    // Positive half softer, negative half slightly harder
    let saturated = if biased >= 0.0 {
        (biased * (1.0 + drive)).tanh()
    } else {
        (biased * (1.0 + drive * NEGATIVE_SLOPE)).tanh()
    };

    let output = saturated / drive_gain;

    input * (1.0 - drive * DRIVE_WET) + output * drive * DRIVE_WET + output * FIXED_WET
}

/// Soft clip anything beyond `SAFETY_CLIP_RATIO * threshold`
///
/// Output magnitude is bounded by `threshold` once clipping engages, and
/// by `SAFETY_CLIP_RATIO * threshold` otherwise.
#[inline]
pub fn safety_clip(sample: f32, threshold: f32) -> f32 {
    if sample.abs() > threshold * SAFETY_CLIP_RATIO {
        (sample / threshold).tanh() * threshold
    } else {
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_is_asymmetric() {
        let pos = transformer_curve(0.3, 1.0, 4.0);
        let neg = transformer_curve(-0.3, 1.0, 4.0);
        assert!(pos > 0.0);
        assert!(neg < 0.0);
        assert!(
            (pos.abs() - neg.abs()).abs() > 1e-3,
            "expected asymmetry: {} vs {}",
            pos,
            neg
        );
    }

    #[test]
    fn test_curve_passes_zero() {
        for drive in [0.1, 0.5, 1.0] {
            assert_eq!(transformer_curve(0.0, drive, 1.0 + drive * 3.0), 0.0);
        }
    }

    #[test]
    fn test_curve_compresses_peaks() {
        // Large inputs come out smaller relative to small inputs
        let small = transformer_curve(0.01, 1.0, 4.0) / 0.01;
        let large = transformer_curve(2.0, 1.0, 4.0) / 2.0;
        assert!(large < small);
    }

    #[test]
    fn test_safety_clip_below_ratio_passthrough() {
        let threshold = 0.5;
        for sample in [0.0, 0.3, -0.54, 0.549] {
            assert_eq!(safety_clip(sample, threshold), sample);
        }
    }

    #[test]
    fn test_safety_clip_bounds_output() {
        let threshold = 0.5;
        for sample in [0.56, 1.0, 10.0, -3.0, -1000.0] {
            let out = safety_clip(sample, threshold);
            assert!(out.abs() <= threshold, "{} -> {}", sample, out);
            assert_eq!(out.signum(), sample.signum());
        }
    }
}
