//! Band aggregation with adaptive loudness normalization
//!
//! Collapses raw FFT magnitude bins into a coarse band-energy vector and
//! normalizes it against a slow-moving loudness reference, so downstream
//! detectors see comparable `[0, 1]` intensities regardless of the source
//! track's mix level.
//!
//! Algorithm per frame:
//! 1. Partition raw bins into `band_count` contiguous groups; average each
//! 2. Track the maximum group average in a bounded history
//! 3. Exponentially smooth a loudness reference toward the historical max
//! 4. Normalize each group by `gain / reference`, clamp to [0, 1]
//! 5. Smooth the clamped value against the previous tick's smoothed value

use std::collections::VecDeque;

use crate::error::AnalysisError;

/// Floor for the loudness reference so near-silent input cannot divide by zero
const MIN_REFERENCE: f32 = 1e-4;

/// Aggregates raw spectrum bins into a normalized band-energy vector
#[derive(Debug, Clone)]
pub struct BandAggregator {
    band_count: usize,
    smoothing: f32,
    gain: f32,
    reference_alpha: f32,
    max_history: VecDeque<f32>,
    max_history_len: usize,
    reference: f32,
    smoothed: Vec<f32>,
    normalized: Vec<f32>,
    prev_normalized: Vec<f32>,
}

impl BandAggregator {
    /// Create an aggregator producing `band_count` bands
    ///
    /// # Arguments
    ///
    /// * `band_count` - Number of output bands (typically 64)
    /// * `smoothing` - Per-tick smoothing factor in (0, 1]; higher = more responsive
    /// * `gain` - Normalization gain applied before clamping (typically 4.0)
    /// * `reference_alpha` - Smoothing rate of the loudness reference (typically 0.05)
    /// * `max_history_len` - Bounded history length for the frame maxima (typically 100)
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` for out-of-range parameters
    pub fn new(
        band_count: usize,
        smoothing: f32,
        gain: f32,
        reference_alpha: f32,
        max_history_len: usize,
    ) -> Result<Self, AnalysisError> {
        if band_count == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Band count must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&smoothing) || smoothing <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "Smoothing factor must be in (0, 1], got {}",
                smoothing
            )));
        }
        if gain <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "Normalization gain must be > 0, got {}",
                gain
            )));
        }
        if !(0.0..=1.0).contains(&reference_alpha) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Reference alpha must be in [0, 1], got {}",
                reference_alpha
            )));
        }
        if max_history_len == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Max-energy history length must be > 0".to_string(),
            ));
        }

        Ok(Self {
            band_count,
            smoothing,
            gain,
            reference_alpha,
            max_history: VecDeque::with_capacity(max_history_len),
            max_history_len,
            reference: MIN_REFERENCE,
            smoothed: vec![0.0; band_count],
            normalized: vec![0.0; band_count],
            prev_normalized: vec![0.0; band_count],
        })
    }

    /// Ingest one frame of raw magnitude bins
    ///
    /// Returns `true` if the frame was aggregated, `false` if the tick was
    /// skipped (empty or non-finite frame). A skipped tick retains all
    /// prior state so downstream consumers never see a reset to zero.
    pub fn ingest(&mut self, bins: &[f32]) -> bool {
        if bins.is_empty() {
            log::debug!("Empty spectrum frame, skipping tick");
            return false;
        }
        if bins.iter().any(|v| !v.is_finite()) {
            log::warn!("Non-finite magnitude in spectrum frame, skipping tick");
            return false;
        }

        // Shadow copy of the previous tick's normalized vector for flux
        self.prev_normalized.copy_from_slice(&self.normalized);

        let group_size = (bins.len() / self.band_count).max(1);
        let mut frame_max = 0.0f32;

        let mut group_averages = vec![0.0f32; self.band_count];
        for (i, avg) in group_averages.iter_mut().enumerate() {
            let start = i * group_size;
            if start >= bins.len() {
                break;
            }
            let end = (start + group_size).min(bins.len());
            let sum: f32 = bins[start..end].iter().sum();
            *avg = sum / (end - start) as f32;
            frame_max = frame_max.max(*avg);
        }

        // Bounded FIFO history of frame maxima
        if self.max_history.len() == self.max_history_len {
            self.max_history.pop_front();
        }
        self.max_history.push_back(frame_max);

        let historical_max = self
            .max_history
            .iter()
            .copied()
            .fold(0.0f32, f32::max)
            .max(MIN_REFERENCE);

        // Slow-moving loudness reference follows the historical max
        self.reference += self.reference_alpha * (historical_max - self.reference);
        self.reference = self.reference.max(MIN_REFERENCE);

        let scale = self.gain / self.reference;
        for i in 0..self.band_count {
            let value = (group_averages[i] * scale).clamp(0.0, 1.0);
            self.normalized[i] = value;
            self.smoothed[i] += self.smoothing * (value - self.smoothed[i]);
        }

        true
    }

    /// Current normalized band energies, hard-clamped to [0, 1]
    pub fn normalized(&self) -> &[f32] {
        &self.normalized
    }

    /// Previous tick's normalized band energies
    pub fn prev_normalized(&self) -> &[f32] {
        &self.prev_normalized
    }

    /// Current smoothed band energies
    pub fn smoothed(&self) -> &[f32] {
        &self.smoothed
    }

    /// Mean of the current normalized vector
    pub fn mean_energy(&self) -> f32 {
        if self.normalized.is_empty() {
            return 0.0;
        }
        self.normalized.iter().sum::<f32>() / self.normalized.len() as f32
    }

    /// Mean of the current smoothed vector
    pub fn mean_smoothed(&self) -> f32 {
        if self.smoothed.is_empty() {
            return 0.0;
        }
        self.smoothed.iter().sum::<f32>() / self.smoothed.len() as f32
    }

    /// Current loudness reference (for diagnostics)
    pub fn reference(&self) -> f32 {
        self.reference
    }

    /// Discard all state for a new playback session
    pub fn reset(&mut self) {
        self.max_history.clear();
        self.reference = MIN_REFERENCE;
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
        self.normalized.iter_mut().for_each(|v| *v = 0.0);
        self.prev_normalized.iter_mut().for_each(|v| *v = 0.0);
    }
}
