//! Audio Block
//!
//! A borrowed, in-place view over one or two channel buffers.
//! Every stage in the strip processes an `AudioBlock`; the block never
//! owns or allocates sample memory.

use crate::error::DspError;

/// Maximum number of channels any stage keeps state for (mono or stereo)
pub const MAX_CHANNELS: usize = 2;

/// One block of planar audio, processed in place
///
/// Buffer format is one slice per channel: `left = [L0, L1, ...]`,
/// `right = [R0, R1, ...]`. Both channels always have the same length.
#[derive(Debug)]
pub struct AudioBlock<'a> {
    left: &'a mut [f32],
    right: Option<&'a mut [f32]>,
}

impl<'a> AudioBlock<'a> {
    /// Wrap a single channel
    pub fn mono(samples: &'a mut [f32]) -> Self {
        Self {
            left: samples,
            right: None,
        }
    }

    /// Wrap a stereo pair
    ///
    /// Fails if the two channels have different lengths.
    pub fn stereo(left: &'a mut [f32], right: &'a mut [f32]) -> Result<Self, DspError> {
        if left.len() != right.len() {
            return Err(DspError::BufferSizeMismatch {
                expected: left.len(),
                got: right.len(),
            });
        }
        Ok(Self {
            left,
            right: Some(right),
        })
    }

    /// Number of channels in this block (1 or 2)
    pub fn num_channels(&self) -> usize {
        if self.right.is_some() {
            2
        } else {
            1
        }
    }

    /// Number of frames in this block
    pub fn num_samples(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn is_stereo(&self) -> bool {
        self.right.is_some()
    }

    /// Read-only access to one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        match index {
            0 => Some(&*self.left),
            1 => self.right.as_deref(),
            _ => None,
        }
    }

    /// Iterate mutable channel slices in channel order
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> + '_ {
        std::iter::once(&mut *self.left).chain(self.right.as_deref_mut())
    }

    /// Split into left and (optional) right for frame-wise processing
    pub fn split_mut(&mut self) -> (&mut [f32], Option<&mut [f32]>) {
        (&mut *self.left, self.right.as_deref_mut())
    }

    /// Peak magnitude of each channel (max |x|)
    ///
    /// Absent channels report 0.0.
    pub fn peaks(&self) -> [f32; MAX_CHANNELS] {
        let mut peaks = [0.0; MAX_CHANNELS];
        for (ch, peak) in peaks.iter_mut().enumerate() {
            if let Some(samples) = self.channel(ch) {
                *peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
            }
        }
        peaks
    }
}
