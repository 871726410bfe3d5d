//! Bassline groove detection
//!
//! Watches the bass band for repeating energy peaks and classifies the
//! rhythmic pattern from the spacing between them. Intervals are measured
//! in wall-clock seconds, never in ticks, so the estimated tempo is
//! independent of the host's update rate.
//!
//! Algorithm per tick:
//! 1. Append (timestamp, bass energy) to a time-bounded history
//! 2. Find strict local-maximum peaks above the peak floor
//! 3. With >= 4 peaks, compute inter-peak intervals in seconds
//! 4. Consistency = `1 - min(1, mad / mean_interval)`
//! 5. If consistent enough, classify tempo from `bpm = 60 / mean_interval`

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-6;

/// Classified groove tempo band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroovePattern {
    /// Below 90 BPM
    SlowGroove,
    /// 90-120 BPM
    MidGroove,
    /// 120-140 BPM
    FastGroove,
    /// Above 140 BPM
    RapidGroove,
}

impl GroovePattern {
    /// Classify a tempo into a pattern band
    pub fn from_bpm(bpm: f32) -> Self {
        if bpm < 90.0 {
            GroovePattern::SlowGroove
        } else if bpm < 120.0 {
            GroovePattern::MidGroove
        } else if bpm < 140.0 {
            GroovePattern::FastGroove
        } else {
            GroovePattern::RapidGroove
        }
    }

    /// Pattern name as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            GroovePattern::SlowGroove => "slow_groove",
            GroovePattern::MidGroove => "mid_groove",
            GroovePattern::FastGroove => "fast_groove",
            GroovePattern::RapidGroove => "rapid_groove",
        }
    }
}

/// Current groove classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrooveState {
    /// True when a consistent bass pattern is active
    pub active: bool,
    /// Interval consistency in [0, 1]
    pub confidence: f32,
    /// Classified pattern when active
    pub pattern: Option<GroovePattern>,
    /// Estimated tempo in BPM (0.0 when inactive)
    pub bpm: f32,
}

impl Default for GrooveState {
    fn default() -> Self {
        Self {
            active: false,
            confidence: 0.0,
            pattern: None,
            bpm: 0.0,
        }
    }
}

/// Groove detector configuration
#[derive(Debug, Clone)]
pub struct GrooveConfig {
    /// History window in seconds (default: 6.0)
    pub window_seconds: f32,
    /// Minimum peak energy (default: 0.3)
    pub peak_floor: f32,
    /// Minimum peaks in the window before classification (default: 4)
    pub min_peaks: usize,
    /// Minimum interval consistency for detection (default: 0.7)
    pub consistency_gate: f32,
}

impl Default for GrooveConfig {
    fn default() -> Self {
        Self {
            window_seconds: 6.0,
            peak_floor: 0.3,
            min_peaks: 4,
            consistency_gate: 0.7,
        }
    }
}

impl GrooveConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_seconds <= 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "Groove window must be > 0".to_string(),
            ));
        }
        if self.min_peaks < 2 {
            return Err(AnalysisError::InvalidConfig(
                "Groove detection needs at least 2 peaks".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.consistency_gate) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Consistency gate must be in [0, 1], got {}",
                self.consistency_gate
            )));
        }
        Ok(())
    }
}

/// Streaming bassline groove detector
#[derive(Debug, Clone)]
pub struct GrooveDetector {
    cfg: GrooveConfig,
    history: VecDeque<(f32, f32)>,
    state: GrooveState,
}

impl GrooveDetector {
    /// Create a detector with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` for out-of-range parameters
    pub fn new(cfg: GrooveConfig) -> Result<Self, AnalysisError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            history: VecDeque::new(),
            state: GrooveState::default(),
        })
    }

    /// Run one tick of detection with the current bass-band energy
    pub fn process(&mut self, bass_energy: f32, now: f32) -> GrooveState {
        if !bass_energy.is_finite() {
            log::warn!("Non-finite bass energy, skipping groove tick");
            return self.state;
        }

        self.history.push_back((now, bass_energy));
        while let Some(&(t, _)) = self.history.front() {
            if now - t > self.cfg.window_seconds {
                self.history.pop_front();
            } else {
                break;
            }
        }

        let peaks = self.find_peaks();
        if peaks.len() < self.cfg.min_peaks {
            self.state = GrooveState::default();
            return self.state;
        }

        let intervals: Vec<f32> = peaks.windows(2).map(|w| w[1] - w[0]).collect();
        let mean_interval = intervals.iter().sum::<f32>() / intervals.len() as f32;
        if mean_interval < EPSILON {
            self.state = GrooveState::default();
            return self.state;
        }

        let mad = intervals
            .iter()
            .map(|&i| (i - mean_interval).abs())
            .sum::<f32>()
            / intervals.len() as f32;
        let consistency = 1.0 - (mad / mean_interval).min(1.0);

        if consistency > self.cfg.consistency_gate {
            let bpm = 60.0 / mean_interval;
            let pattern = GroovePattern::from_bpm(bpm);
            if !self.state.active || self.state.pattern != Some(pattern) {
                log::debug!(
                    "Groove detected at {:.3}s: {} ({:.1} BPM, consistency {:.3})",
                    now,
                    pattern.as_str(),
                    bpm,
                    consistency
                );
            }
            self.state = GrooveState {
                active: true,
                confidence: consistency,
                pattern: Some(pattern),
                bpm,
            };
        } else {
            self.state = GrooveState {
                active: false,
                confidence: consistency,
                pattern: None,
                bpm: 0.0,
            };
        }

        self.state
    }

    /// Current groove classification
    pub fn state(&self) -> GrooveState {
        self.state
    }

    /// Discard all state for a new playback session
    pub fn reset(&mut self) {
        self.history.clear();
        self.state = GrooveState::default();
    }

    /// Timestamps of strict local-maximum peaks above the floor
    fn find_peaks(&self) -> Vec<f32> {
        let mut peaks = Vec::new();
        for i in 1..self.history.len().saturating_sub(1) {
            let (t, v) = self.history[i];
            if v > self.cfg.peak_floor && v > self.history[i - 1].1 && v > self.history[i + 1].1 {
                peaks.push(t);
            }
        }
        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a square-wave bass pattern with the given period and tick rate
    fn feed_pattern(det: &mut GrooveDetector, period: f32, tick: f32, duration: f32) -> GrooveState {
        let mut now = 0.0;
        let mut state = GrooveState::default();
        let mut next_pulse = 0.0;
        while now < duration {
            // Single-tick energy pulse at each period boundary
            let energy = if (now - next_pulse).abs() < tick / 2.0 {
                next_pulse += period;
                0.8
            } else {
                0.1
            };
            state = det.process(energy, now);
            now += tick;
        }
        state
    }

    #[test]
    fn test_periodic_bass_detected_with_high_consistency() {
        let mut det = GrooveDetector::new(GrooveConfig::default()).unwrap();
        // 0.48s period = 125 BPM, exactly divisible by the tick rate
        let state = feed_pattern(&mut det, 0.48, 0.03, 8.0);

        assert!(state.active, "periodic bass should be detected");
        assert!(
            state.confidence > 0.95,
            "perfectly periodic input should be highly consistent, got {}",
            state.confidence
        );
        assert!(
            (state.bpm - 125.0).abs() < 3.0,
            "BPM should be ~125, got {}",
            state.bpm
        );
        assert_eq!(state.pattern, Some(GroovePattern::FastGroove));
    }

    #[test]
    fn test_bpm_independent_of_tick_rate() {
        // Same wall-clock period at two different tick rates must yield
        // the same BPM classification
        let mut det_a = GrooveDetector::new(GrooveConfig::default()).unwrap();
        let mut det_b = GrooveDetector::new(GrooveConfig::default()).unwrap();

        let state_a = feed_pattern(&mut det_a, 0.48, 0.03, 8.0);
        let state_b = feed_pattern(&mut det_b, 0.48, 0.015, 8.0);

        assert!(state_a.active && state_b.active);
        assert!(
            (state_a.bpm - state_b.bpm).abs() < 3.0,
            "BPM must not depend on tick rate: {} vs {}",
            state_a.bpm,
            state_b.bpm
        );
        assert_eq!(state_a.pattern, state_b.pattern);
    }

    #[test]
    fn test_too_few_peaks_stays_inactive() {
        let mut det = GrooveDetector::new(GrooveConfig::default()).unwrap();
        // Only ~2 pulses inside the window
        let state = feed_pattern(&mut det, 0.48, 0.03, 1.0);
        assert!(!state.active, "fewer than 4 peaks must not classify");
    }

    #[test]
    fn test_quiet_bass_ignored() {
        let mut det = GrooveDetector::new(GrooveConfig::default()).unwrap();
        let mut now = 0.0;
        // Periodic but below the 0.3 peak floor
        for i in 0..200 {
            let energy = if i % 16 == 0 { 0.25 } else { 0.05 };
            det.process(energy, now);
            now += 0.03;
        }
        assert!(!det.state().active, "sub-floor peaks must not classify");
    }

    #[test]
    fn test_irregular_bass_low_consistency() {
        let mut det = GrooveDetector::new(GrooveConfig::default()).unwrap();
        let mut now = 0.0;
        // Irregular pulse spacing: intervals alternate 0.2s / 0.7s
        let mut state = GrooveState::default();
        let mut next_pulse = 0.0;
        let mut long_gap = false;
        for _ in 0..300 {
            let energy = if now >= next_pulse {
                next_pulse += if long_gap { 0.7 } else { 0.2 };
                long_gap = !long_gap;
                0.8
            } else {
                0.1
            };
            state = det.process(energy, now);
            now += 0.03;
        }
        assert!(
            !state.active,
            "irregular intervals should stay below the consistency gate, got {}",
            state.confidence
        );
    }

    #[test]
    fn test_pattern_classification_bands() {
        assert_eq!(GroovePattern::from_bpm(80.0), GroovePattern::SlowGroove);
        assert_eq!(GroovePattern::from_bpm(100.0), GroovePattern::MidGroove);
        assert_eq!(GroovePattern::from_bpm(130.0), GroovePattern::FastGroove);
        assert_eq!(GroovePattern::from_bpm(160.0), GroovePattern::RapidGroove);
    }

    #[test]
    fn test_non_finite_energy_skipped() {
        let mut det = GrooveDetector::new(GrooveConfig::default()).unwrap();
        det.process(0.5, 0.0);
        let before = det.state();
        let after = det.process(f32::NAN, 0.03);
        assert_eq!(before, after, "non-finite input must not corrupt state");
    }

    #[test]
    fn test_config_validation() {
        assert!(GrooveConfig::default().validate().is_ok());
        let bad = GrooveConfig {
            min_peaks: 1,
            ..GrooveConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
