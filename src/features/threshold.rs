//! Adaptive per-channel threshold tracking
//!
//! Each detector channel keeps a bounded history of recent flux values and
//! derives its firing threshold from that history's statistics:
//!
//! `threshold = mean + 0.5 * stddev + 0.05 * median`
//!
//! The threshold is fully data-driven, which matters because the engine
//! has no prior knowledge of a track's genre, loudness, or mix. A fixed
//! secondary energy floor additionally gates detection during near-silence.

use std::collections::VecDeque;

/// Bounded FIFO history of flux values with rolling statistics
#[derive(Debug, Clone)]
pub struct FluxHistory {
    values: VecDeque<f32>,
    capacity: usize,
}

impl FluxHistory {
    /// Create a history holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Push a sample, evicting the oldest once full
    pub fn push(&mut self, value: f32) {
        if !value.is_finite() {
            log::warn!("Dropping non-finite flux sample: {}", value);
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the history holds no samples
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean, 0.0 when empty
    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    /// Population standard deviation, 0.0 when empty
    pub fn std_dev(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .values
            .iter()
            .map(|&v| {
                let d = v - mean;
                d * d
            })
            .sum::<f32>()
            / self.values.len() as f32;
        variance.sqrt()
    }

    /// Median via sort, 0.0 when empty
    pub fn median(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f32> = self.values.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) * 0.5
        } else {
            sorted[sorted.len() / 2]
        }
    }

    /// Data-driven threshold: `mean + 0.5 * stddev + 0.05 * median`
    pub fn adaptive_threshold(&self) -> f32 {
        self.mean() + 0.5 * self.std_dev() + 0.05 * self.median()
    }

    /// Clear all samples
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
