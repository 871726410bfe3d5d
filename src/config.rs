//! Analyzer configuration
//!
//! All tunable parameters in one place. Defaults are calibrated for
//! 64-band analysis of club-oriented electronic music at a 30-60 Hz tick
//! rate, but every detector is data-driven enough to degrade gracefully
//! on other material.

use crate::error::AnalysisError;
use crate::features::groove::GrooveConfig;
use crate::features::percussive::PercussiveConfig;
use crate::features::transition::TransitionConfig;
use crate::features::vocal::VocalConfig;

/// Top-level configuration for [`SpectrumAnalyzer`](crate::analysis::SpectrumAnalyzer)
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Number of aggregated frequency bands (default: 64)
    pub band_count: usize,
    /// Exponential smoothing factor for band energies (default: 0.35)
    pub smoothing_factor: f32,
    /// Gain applied before clamping to [0, 1] (default: 4.0)
    pub normalization_gain: f32,
    /// Adaptation rate of the loudness reference (default: 0.05)
    pub max_energy_alpha: f32,
    /// Frame maxima retained for loudness adaptation (default: 100)
    pub max_energy_history: usize,
    /// Flux history length per percussive channel (default: 64)
    pub flux_window: usize,
    /// Flux samples required before percussive detection (default: 16)
    pub min_flux_samples: usize,
    /// Minimum band energy for a percussive onset (default: 0.2)
    pub energy_floor: f32,
    /// Onset timestamps retained for tempo estimation (default: 32)
    pub beat_history: usize,
    /// Percussive channel cooldowns
    pub percussive: PercussiveConfig,
    /// Vocal presence detector parameters
    pub vocal: VocalConfig,
    /// Groove detector parameters
    pub groove: GrooveConfig,
    /// Build/drop detector parameters
    pub transition: TransitionConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            band_count: 64,
            smoothing_factor: 0.35,
            normalization_gain: 4.0,
            max_energy_alpha: 0.05,
            max_energy_history: 100,
            flux_window: 64,
            min_flux_samples: 16,
            energy_floor: 0.2,
            beat_history: 32,
            percussive: PercussiveConfig::default(),
            vocal: VocalConfig::default(),
            groove: GrooveConfig::default(),
            transition: TransitionConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Validate all parameters, including nested detector configs
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` naming the offending field
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.band_count == 0 {
            return Err(AnalysisError::InvalidConfig(
                "Band count must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_factor) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Smoothing factor must be in [0, 1], got {}",
                self.smoothing_factor
            )));
        }
        if !(self.normalization_gain.is_finite() && self.normalization_gain > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Normalization gain must be finite and > 0, got {}",
                self.normalization_gain
            )));
        }
        if !(0.0..=1.0).contains(&self.max_energy_alpha) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Loudness adaptation rate must be in [0, 1], got {}",
                self.max_energy_alpha
            )));
        }
        if self.max_energy_history == 0 || self.flux_window == 0 {
            return Err(AnalysisError::InvalidConfig(
                "History lengths must be > 0".to_string(),
            ));
        }
        if self.min_flux_samples > self.flux_window {
            return Err(AnalysisError::InvalidConfig(
                "Flux warm-up cannot exceed the flux window".to_string(),
            ));
        }
        if !(self.energy_floor.is_finite() && self.energy_floor >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Energy floor must be finite and >= 0, got {}",
                self.energy_floor
            )));
        }
        if self.beat_history < 2 {
            return Err(AnalysisError::InvalidConfig(
                "Tempo estimation needs at least 2 beat timestamps".to_string(),
            ));
        }
        self.percussive.validate()?;
        self.vocal.validate()?;
        self.groove.validate()?;
        self.transition.validate()?;
        Ok(())
    }
}
