//! Frame ingest and band aggregation
//!
//! The analysis core never touches decoded audio: its only input is a
//! timestamped snapshot of FFT magnitude bins produced by the host's
//! audio backend once per analysis tick.

pub mod aggregator;
pub mod bands;

use crate::error::AnalysisError;

/// One spectrum snapshot, immutable once captured
///
/// `bins` holds `fft_size / 2` non-negative magnitudes. The caller
/// guarantees monotonically increasing `now_seconds` and a stable
/// `fft_size` for the duration of one playback session.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumFrame<'a> {
    /// Raw magnitude bins (length = fft_size / 2)
    pub bins: &'a [f32],
    /// FFT size the bins were produced from
    pub fft_size: usize,
    /// Source sample rate in Hz
    pub sample_rate: u32,
    /// Wall-clock timestamp of this frame in seconds
    pub now_seconds: f32,
}

impl<'a> SpectrumFrame<'a> {
    /// Validate the frame's structural invariants
    ///
    /// An empty `bins` slice is *not* an error here: the pipeline treats
    /// it as a skipped tick (see the error handling contract). Mismatched
    /// sizes and bad parameters are rejected.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for zero fft size or sample
    /// rate, a non-finite timestamp, or a bin count that disagrees with
    /// `fft_size / 2`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.fft_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "FFT size must be > 0".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Sample rate must be > 0".to_string(),
            ));
        }
        if !self.now_seconds.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "Timestamp must be finite, got {}",
                self.now_seconds
            )));
        }
        if !self.bins.is_empty() && self.bins.len() != self.fft_size / 2 {
            return Err(AnalysisError::InvalidInput(format!(
                "Expected {} bins for FFT size {}, got {}",
                self.fft_size / 2,
                self.fft_size,
                self.bins.len()
            )));
        }
        Ok(())
    }
}
