//! Oxbow Core - Console Channel Strip
//!
//! This crate assembles the `oxbow_dsp` stages into a complete channel strip:
//! - Fixed console signal chain with switchable EQ placement
//! - Lock-free parameter block shared between control and audio threads
//! - Peak and gain-reduction metering
//! - JSON settings persistence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Control Thread                          │
//! │   StripParameters::set_*  ──atomics──▶  (clamped values)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ snapshot once per block
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   Gain ─▶ HPF ─▶ Transformer ─▶ EQ/Comp/Limiter ─▶ Output  │
//! │     │                                               │       │
//! │     └────────────── StripMeters (atomics) ──────────┘       │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod meters;
mod params;
mod settings;
mod strip;

pub use config::StripConfig;
pub use error::{StripError, StripResult};
pub use meters::{MeterSnapshot, StripMeters};
pub use params::{AtomicF32, BandSettings, EqPlacement, ParameterSnapshot, StripParameters};
pub use settings::StripSettings;
pub use strip::ChannelStrip;

// Re-export DSP types for convenience
pub use oxbow_dsp::{AudioBlock, BandKind, HpfSetting, Attack, Ratio, Release, MAX_CHANNELS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let config = StripConfig::default();
        let strip = ChannelStrip::new(config).unwrap();
        assert_eq!(strip.meters().snapshot(), MeterSnapshot::default());
        assert_eq!(
            strip.parameters().snapshot(),
            StripSettings::default().parameters
        );
    }
}
