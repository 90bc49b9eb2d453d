//! Channel Strip
//!
//! Owns every DSP stage and runs them in console order:
//!
//! ```text
//! in ─► input gain ─► phase ─► HPF ─► transformer ─► trim ─┬─► EQ ─► comp ─► limiter ─┬─► output ─► out
//!                                                          └─► comp ─► limiter ─► EQ ─┘
//!                                                            (EQ pre / post dynamics)
//! ```
//!
//! # Real-time Safety
//!
//! `process()` and `process_interleaved()` never allocate, lock or log.
//! Parameters are read once per block from the shared [`StripParameters`]
//! and coefficients are only recomputed when a value actually changed.

use std::sync::Arc;

use oxbow_dsp::{
    Attack, AudioBlock, AudioProcessor, BandKind, Compressor, DspError, Equalizer, GainStage,
    HighPassFilter, Limiter, OutputStage, Ratio, Release, Transformer, MAX_CHANNELS,
};
use tracing::{debug, info};

use crate::config::StripConfig;
use crate::error::{StripError, StripResult};
use crate::meters::StripMeters;
use crate::params::{EqPlacement, ParameterSnapshot, StripParameters};

/// The complete channel strip
pub struct ChannelStrip {
    config: StripConfig,
    parameters: Arc<StripParameters>,
    meters: Arc<StripMeters>,

    gain: GainStage,
    hpf: HighPassFilter,
    transformer: Transformer,
    eq: Equalizer,
    compressor: Compressor,
    limiter: Limiter,
    output: OutputStage,

    placement: EqPlacement,
    /// Last snapshot pushed into the stages
    applied: Option<ParameterSnapshot>,
    /// Deinterleave buffers, sized in `prepare`
    scratch: [Vec<f32>; MAX_CHANNELS],
}

impl ChannelStrip {
    /// Create a strip with its own default parameter block
    pub fn new(config: StripConfig) -> StripResult<Self> {
        Self::with_parameters(config, Arc::new(StripParameters::new()))
    }

    /// Create a strip driven by an existing parameter block
    pub fn with_parameters(config: StripConfig, parameters: Arc<StripParameters>) -> StripResult<Self> {
        config.validate()?;

        let sample_rate = config.sample_rate as f32;
        let mut strip = Self {
            config,
            parameters,
            meters: Arc::new(StripMeters::new()),
            gain: GainStage::new(),
            hpf: HighPassFilter::new(sample_rate),
            transformer: Transformer::new(sample_rate),
            eq: Equalizer::new(sample_rate),
            compressor: Compressor::new(sample_rate),
            limiter: Limiter::new(sample_rate),
            output: OutputStage::new(),
            placement: EqPlacement::default(),
            applied: None,
            scratch: Default::default(),
        };
        strip.prepare_stages()?;
        Ok(strip)
    }

    /// Re-prepare for a new sample rate or maximum block size
    ///
    /// Recomputes every coefficient, resizes scratch memory and clears all
    /// filter and envelope state. Call from a non-real-time thread.
    pub fn prepare(&mut self, sample_rate: u32, max_block_size: usize) -> StripResult<()> {
        let config = StripConfig {
            sample_rate,
            max_block_size,
            ..self.config
        };
        config.validate()?;
        self.config = config;
        self.prepare_stages()
    }

    fn prepare_stages(&mut self) -> StripResult<()> {
        let context = self.config.process_context()?;

        self.scratch = [
            vec![0.0; self.config.max_block_size],
            vec![0.0; self.config.max_block_size],
        ];

        // Targets first, so the smoothed gains start settled on them
        self.applied = None;
        let snapshot = self.parameters.snapshot();
        self.apply_parameters(&snapshot);

        self.gain.prepare(context.sample_rate);
        self.hpf.prepare(&context);
        self.transformer.prepare(&context);
        self.eq.prepare(&context);
        self.compressor.prepare(&context);
        self.limiter.prepare(&context);
        self.output.prepare(&context);
        self.meters.clear();

        info!(
            "Channel strip prepared: {} Hz, {} ch, {} frames ({:.2} ms)",
            self.config.sample_rate,
            self.config.channels,
            self.config.max_block_size,
            self.config.latency_ms()
        );
        Ok(())
    }

    /// Clear all filter, envelope and meter state; parameters are kept
    pub fn reset(&mut self) {
        self.gain.reset();
        self.hpf.reset();
        self.transformer.reset();
        self.eq.reset();
        self.compressor.reset();
        self.limiter.reset();
        self.output.reset();
        self.meters.clear();
        debug!("Channel strip reset");
    }

    /// Shared parameter block, for the control thread
    pub fn parameters(&self) -> Arc<StripParameters> {
        Arc::clone(&self.parameters)
    }

    /// Shared meters, for a UI poller
    pub fn meters(&self) -> Arc<StripMeters> {
        Arc::clone(&self.meters)
    }

    pub fn config(&self) -> &StripConfig {
        &self.config
    }

    /// Routing used by the last processed block
    pub fn eq_placement(&self) -> EqPlacement {
        self.placement
    }

    /// Push a parameter snapshot into the stages if anything changed
    fn apply_parameters(&mut self, p: &ParameterSnapshot) {
        if self.applied.as_ref() == Some(p) {
            return;
        }

        self.gain.set_input_gain_db(p.input_gain_db);
        self.gain.set_phase_inverted(p.phase_invert);
        self.gain.set_output_trim_db(p.output_trim_db);
        self.hpf.set_frequency(p.hpf_index);
        self.transformer.set_drive(p.drive_percent);

        self.eq.set_bypass(p.eq_bypass);
        for kind in BandKind::ALL {
            let band = p.band(kind);
            self.eq.set_band_frequency(kind, band.frequency_index);
            self.eq.set_band_gain(kind, band.gain_db);
        }

        self.compressor.set_bypass(p.comp_bypass);
        self.compressor.set_threshold_db(p.comp_threshold_db);
        self.compressor.set_ratio(Ratio::from_index(p.comp_ratio_index));
        self.compressor.set_attack(Attack::from_index(p.comp_attack_index));
        self.compressor.set_release(Release::from_index(p.comp_release_index));
        self.compressor.set_makeup_db(p.comp_makeup_db);
        self.compressor.set_sidechain_hpf(p.comp_sidechain_hpf);
        self.compressor.set_stereo_link(p.comp_stereo_link);

        self.limiter.set_bypass(p.limiter_bypass);
        self.limiter.set_threshold_db(p.limiter_threshold_db);

        self.output.set_level_db(p.output_level_db);
        self.placement = p.eq_placement;

        self.applied = Some(*p);
    }

    /// Process one planar block in place
    ///
    /// # Real-time Safety
    /// No allocations, no locks, no logging. O(n) in the block length.
    pub fn process(&mut self, block: &mut AudioBlock<'_>) {
        let params = self.parameters.snapshot();
        let input_peaks = block.peaks();
        self.meters.set_input_peaks(input_peaks);

        if params.master_bypass {
            self.meters.set_output_peaks(input_peaks);
            self.meters.set_gain_reduction(0.0, 0.0);
            return;
        }

        self.apply_parameters(&params);

        // Preamp
        self.gain.process_input(block);
        self.hpf.process(block);
        self.transformer.process(block);
        self.gain.process_trim(block);

        // EQ + dynamics; the compressor always feeds the limiter
        match self.placement {
            EqPlacement::PreDynamics => {
                self.eq.process(block);
                self.compressor.process(block);
                self.limiter.process(block);
            }
            EqPlacement::PostDynamics => {
                self.compressor.process(block);
                self.limiter.process(block);
                self.eq.process(block);
            }
        }

        self.output.process(block);

        self.meters.set_output_peaks(block.peaks());
        let compressor_db = if self.compressor.is_bypassed() {
            0.0
        } else {
            self.compressor.gain_reduction()
        };
        let limiter_db = if self.limiter.is_bypassed() {
            0.0
        } else {
            self.limiter.gain_reduction()
        };
        self.meters.set_gain_reduction(compressor_db, limiter_db);
    }

    /// Process an interleaved buffer in place
    ///
    /// Buffer format: `[L0, R0, L1, R1, ...]` for stereo, plain samples
    /// for mono. Long buffers are processed in chunks of the prepared
    /// block size.
    ///
    /// # Real-time Safety
    /// Deinterleaves through the scratch buffers allocated in `prepare`.
    pub fn process_interleaved(&mut self, buffer: &mut [f32], channels: usize) -> StripResult<()> {
        let block_frames = self.config.max_block_size;

        match channels {
            1 => {
                for chunk in buffer.chunks_mut(block_frames) {
                    self.process(&mut AudioBlock::mono(chunk));
                }
                Ok(())
            }
            2 => {
                if buffer.len() % 2 != 0 {
                    return Err(StripError::RaggedInterleavedBuffer {
                        len: buffer.len(),
                        channels,
                    });
                }
                // Moving the buffers out leaves empty Vecs behind, no allocation
                let mut scratch = std::mem::take(&mut self.scratch);
                let result = self.process_interleaved_stereo(buffer, &mut scratch);
                self.scratch = scratch;
                result
            }
            other => Err(DspError::UnsupportedChannelCount(other).into()),
        }
    }

    fn process_interleaved_stereo(
        &mut self,
        buffer: &mut [f32],
        scratch: &mut [Vec<f32>; MAX_CHANNELS],
    ) -> StripResult<()> {
        let [left, right] = scratch;
        let block_frames = left.len().min(right.len());
        if block_frames == 0 {
            return Err(StripError::InvalidBlockSize(block_frames));
        }

        for chunk in buffer.chunks_mut(block_frames * 2) {
            let frames = chunk.len() / 2;

            for ((frame, l), r) in chunk
                .chunks_exact(2)
                .zip(left[..frames].iter_mut())
                .zip(right[..frames].iter_mut())
            {
                *l = frame[0];
                *r = frame[1];
            }

            let mut block = AudioBlock::stereo(&mut left[..frames], &mut right[..frames])?;
            self.process(&mut block);

            for ((frame, l), r) in chunk
                .chunks_exact_mut(2)
                .zip(left[..frames].iter())
                .zip(right[..frames].iter())
            {
                frame[0] = *l;
                frame[1] = *r;
            }
        }
        Ok(())
    }
}
