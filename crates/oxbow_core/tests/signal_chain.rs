//! Whole-strip behaviour through the public API

use std::f32::consts::TAU;
use std::sync::Arc;
use std::thread;

use oxbow_core::{
    AudioBlock, BandKind, ChannelStrip, EqPlacement, MeterSnapshot, StripConfig,
    StripParameters,
};

const FS: f32 = 48000.0;

fn strip_with(params: &Arc<StripParameters>) -> ChannelStrip {
    ChannelStrip::with_parameters(StripConfig::default(), Arc::clone(params)).unwrap()
}

fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (TAU * freq * i as f32 / FS).sin() * amplitude)
        .collect()
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Run a stereo signal through the strip in 512-frame blocks
fn run_stereo(strip: &mut ChannelStrip, left: &mut [f32], right: &mut [f32]) {
    for (l, r) in left.chunks_mut(512).zip(right.chunks_mut(512)) {
        strip.process(&mut AudioBlock::stereo(l, r).unwrap());
    }
}

#[test]
fn hpf_off_passes_samples_unchanged() {
    let params = Arc::new(StripParameters::new());
    params.set_hpf_index(0);
    let mut strip = strip_with(&params);

    let mut samples = vec![1.0, -1.0, 0.5];
    strip.process(&mut AudioBlock::mono(&mut samples));
    assert_eq!(samples, vec![1.0, -1.0, 0.5]);
}

#[test]
fn flat_eq_is_transparent_at_any_frequency_setting() {
    let params = Arc::new(StripParameters::new());
    params.set_eq_bypass(false);
    params.set_band_frequency_index(BandKind::LowShelf, 3);
    params.set_band_frequency_index(BandKind::LowMid, 4);
    params.set_band_frequency_index(BandKind::HighMid, 0);
    params.set_band_frequency_index(BandKind::HighShelf, 2);
    let mut strip = strip_with(&params);

    let original = sine(997.0, 0.8, 4096);
    let (mut left, mut right) = (original.clone(), original.clone());
    run_stereo(&mut strip, &mut left, &mut right);

    assert_eq!(left, original);
    assert_eq!(right, original);
}

#[test]
fn compressor_settles_on_knee_curve() {
    let params = Arc::new(StripParameters::new());
    params.set_comp_bypass(false);
    params.set_comp_threshold_db(-20.0);
    params.set_comp_ratio_index(3); // 4:1
    params.set_comp_sidechain_hpf(false);
    params.set_comp_stereo_link(true);
    let mut strip = strip_with(&params);

    let level = 10f32.powf(-10.0 / 20.0);
    let mut left = vec![level; 48000];
    let mut right = vec![level; 48000];
    run_stereo(&mut strip, &mut left, &mut right);

    let reduction = strip.meters().compressor_reduction_db();
    assert!((reduction - 4.125).abs() < 0.05, "reduction {} dB", reduction);

    let expected = level * 10f32.powf(-4.125 / 20.0);
    assert!((left[47999] - expected).abs() < 1e-3, "output {}", left[47999]);
    assert_eq!(left[47999], right[47999]);
}

#[test]
fn limiter_holds_settled_full_scale_below_threshold() {
    let params = Arc::new(StripParameters::new());
    params.set_limiter_bypass(false);
    params.set_limiter_threshold_db(-6.0);
    let mut strip = strip_with(&params);

    let threshold = 10f32.powf(-6.0 / 20.0);
    let mut left = vec![1.0; 9600];
    let mut right = vec![1.0; 9600];
    run_stereo(&mut strip, &mut left, &mut right);

    let settled = left[9599];
    assert!(settled <= threshold, "settled output {}", settled);
    assert!(settled > threshold * 0.5);
    assert!(strip.meters().limiter_reduction_db() > 0.0);
}

#[test]
fn limiter_ceiling_survives_hot_preamp() {
    let params = Arc::new(StripParameters::new());
    params.set_input_gain_db(40.0);
    params.set_drive_percent(100.0);
    params.set_band_gain_db(BandKind::HighMid, 12.0);
    params.set_limiter_bypass(false);
    params.set_limiter_threshold_db(-6.0);
    let mut strip = strip_with(&params);

    let ceiling = 10f32.powf(-6.0 / 20.0) * 1.1;
    let original = sine(2400.0, 0.9, 9600);
    let (mut left, mut right) = (original.clone(), original.clone());
    run_stereo(&mut strip, &mut left, &mut right);

    assert!(peak(&left) <= ceiling, "peak {}", peak(&left));
    assert!(peak(&right) <= ceiling, "peak {}", peak(&right));
}

#[test]
fn zero_drive_is_transparent() {
    let params = Arc::new(StripParameters::new());
    params.set_drive_percent(0.0);
    let mut strip = strip_with(&params);

    let original: Vec<f32> = (0..2048).map(|i| ((i * 7919) % 200) as f32 / 100.0 - 1.0).collect();
    let mut samples = original.clone();
    strip.process(&mut AudioBlock::mono(&mut samples));
    assert_eq!(samples, original);
}

#[test]
fn master_bypass_leaves_block_untouched() {
    let params = Arc::new(StripParameters::new());
    params.set_input_gain_db(30.0);
    params.set_drive_percent(80.0);
    params.set_comp_bypass(false);
    params.set_comp_threshold_db(-40.0);
    params.set_master_bypass(true);
    let mut strip = strip_with(&params);

    let original = sine(440.0, 0.5, 1024);
    let (mut left, mut right) = (original.clone(), original.clone());
    run_stereo(&mut strip, &mut left, &mut right);
    assert_eq!(left, original);
    assert_eq!(right, original);

    let meters = strip.meters().snapshot();
    assert_eq!(meters.input_peak, meters.output_peak);
    assert_eq!(meters.compressor_reduction_db, 0.0);
    assert_eq!(meters.limiter_reduction_db, 0.0);

    // Releasing the bypass brings the chain back
    params.set_master_bypass(false);
    let (mut left, mut right) = (original.clone(), original.clone());
    run_stereo(&mut strip, &mut left, &mut right);
    assert_ne!(left, original);
    assert!(strip.meters().compressor_reduction_db() > 0.0);
}

#[test]
fn eq_placement_changes_result() {
    fn settled_peak(placement: EqPlacement) -> f32 {
        let params = Arc::new(StripParameters::new());
        params.set_band_gain_db(BandKind::LowShelf, 16.0);
        params.set_comp_bypass(false);
        params.set_comp_threshold_db(-40.0);
        params.set_comp_ratio_index(4); // 6:1
        params.set_eq_placement(placement);
        let mut strip = strip_with(&params);

        let mut left = sine(50.0, 0.5, 48000);
        let mut right = left.clone();
        run_stereo(&mut strip, &mut left, &mut right);
        peak(&left[43200..])
    }

    let pre = settled_peak(EqPlacement::PreDynamics);
    let post = settled_peak(EqPlacement::PostDynamics);
    // Boosting after the compressor escapes the gain reduction
    assert!(post > pre * 2.0, "pre {} post {}", pre, post);
}

#[test]
fn meters_track_levels() {
    let params = Arc::new(StripParameters::new());
    params.set_output_level_db(-6.0);
    let mut strip = strip_with(&params);

    let mut left = vec![0.5; 512];
    let mut right = vec![0.25; 512];
    strip.process(&mut AudioBlock::stereo(&mut left, &mut right).unwrap());

    let meters = strip.meters().snapshot();
    assert_eq!(meters.input_peak, [0.5, 0.25]);
    let gain = 10f32.powf(-6.0 / 20.0);
    assert!((meters.output_peak[0] - 0.5 * gain).abs() < 1e-5);
    assert!((meters.output_peak[1] - 0.25 * gain).abs() < 1e-5);
    assert_eq!(meters.compressor_reduction_db, 0.0);
    assert_eq!(meters.limiter_reduction_db, 0.0);
}

#[test]
fn interleaved_long_buffer_is_chunked() {
    let params = Arc::new(StripParameters::new());
    params.set_output_level_db(-20.0);
    let config = StripConfig::low_latency();
    let mut strip = ChannelStrip::with_parameters(config, params).unwrap();

    // Ten blocks' worth of stereo frames in one call
    let mut buffer = vec![0.5; config.max_block_size * 2 * 10 + 2];
    strip.process_interleaved(&mut buffer, 2).unwrap();

    let expected = 0.5 * 0.1;
    assert!(buffer.iter().all(|s| (s - expected).abs() < 1e-6));
}

#[test]
fn parameters_written_from_another_thread_reach_the_strip() {
    let params = Arc::new(StripParameters::new());
    let mut strip = strip_with(&params);

    let control = Arc::clone(&params);
    thread::spawn(move || {
        control.set_phase_invert(true);
    })
    .join()
    .unwrap();

    let mut samples = vec![0.25; 64];
    strip.process(&mut AudioBlock::mono(&mut samples));
    assert!(samples.iter().all(|s| *s == -0.25));
}

#[test]
fn reprepare_keeps_processing_finite() {
    let params = Arc::new(StripParameters::new());
    params.set_hpf_index(4);
    params.set_drive_percent(60.0);
    params.set_band_gain_db(BandKind::HighShelf, 10.0);
    params.set_comp_bypass(false);
    params.set_comp_release_index(3);
    params.set_limiter_bypass(false);
    let mut strip = strip_with(&params);

    for (rate, block) in [(44100, 256), (96000, 1024), (8000, 1)] {
        strip.prepare(rate, block).unwrap();
        let mut buffer = sine(1000.0, 0.7, 4000);
        strip.process_interleaved(&mut buffer, 2).unwrap();
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}

#[test]
fn reset_then_silence_gives_silence() {
    let params = Arc::new(StripParameters::new());
    params.set_input_gain_db(18.0);
    params.set_hpf_index(2);
    params.set_drive_percent(70.0);
    params.set_band_gain_db(BandKind::LowShelf, 10.0);
    params.set_band_gain_db(BandKind::HighMid, -6.0);
    params.set_comp_bypass(false);
    params.set_comp_release_index(3);
    params.set_limiter_bypass(false);
    let mut strip = strip_with(&params);

    let mut left = sine(80.0, 0.8, 9600);
    let mut right = sine(3000.0, 0.6, 9600);
    run_stereo(&mut strip, &mut left, &mut right);
    assert!(strip.meters().output_peaks()[0] > 0.0);

    strip.reset();
    assert_eq!(strip.meters().snapshot(), MeterSnapshot::default());

    let mut left = vec![0.0; 4096];
    let mut right = vec![0.0; 4096];
    run_stereo(&mut strip, &mut left, &mut right);
    assert!(left.iter().chain(right.iter()).all(|s| *s == 0.0));
    assert_eq!(strip.meters().output_peaks(), [0.0, 0.0]);
}

#[test]
fn reset_lands_gain_glides() {
    let params = Arc::new(StripParameters::new());
    let mut strip = strip_with(&params);

    // Start a 20 dB input gain glide, then reset part way through it
    params.set_input_gain_db(20.0);
    let mut samples = vec![0.01; 16];
    strip.process(&mut AudioBlock::mono(&mut samples));
    strip.reset();

    let mut samples = vec![0.01; 64];
    strip.process(&mut AudioBlock::mono(&mut samples));
    assert!(samples.iter().all(|s| (s - 0.1).abs() < 1e-5), "{:?}", &samples[..4]);
}
