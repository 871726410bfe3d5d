//! Energy build-up / drop detection
//!
//! Classifies EDM-style energy transitions with a dual-window trend
//! analysis over whole-spectrum mean energy. Both rolling averages filter
//! the shared history by elapsed time, not by entry count, so the
//! classification is independent of the host's tick rate.
//!
//! State machine:
//! - `Steady -> Building` when the short average pulls ahead of the long
//!   average and the current energy clearly exceeds the long trend
//! - `Building -> Dropping` when the climb stalls near the decayed peak
//!   tracker; fires a single full-intensity drop
//! - `Dropping` persists for a fixed hold with linearly decaying
//!   intensity, then reverts to `Steady`

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Transition phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionPhase {
    /// No energy trend
    Steady,
    /// Energy ramping up
    Building,
    /// Post-drop release window
    Dropping,
}

impl TransitionPhase {
    /// Phase name as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::Steady => "steady",
            TransitionPhase::Building => "building",
            TransitionPhase::Dropping => "dropping",
        }
    }
}

/// Current transition classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionState {
    /// Current phase
    pub phase: TransitionPhase,
    /// Phase intensity in [0, 1]
    pub intensity: f32,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            phase: TransitionPhase::Steady,
            intensity: 0.0,
        }
    }
}

/// Transition detector configuration
#[derive(Debug, Clone)]
pub struct TransitionConfig {
    /// History window in seconds (default: 2.5)
    pub window_seconds: f32,
    /// Short rolling-average window in seconds (default: 0.6)
    pub short_window: f32,
    /// Long rolling-average window in seconds (default: 1.8)
    pub long_window: f32,
    /// Short-minus-long gap that starts a build (default: 0.05)
    pub build_gap: f32,
    /// Current-over-long ratio that starts a build (default: 1.2)
    pub build_ratio: f32,
    /// Build duration cap for intensity scaling in seconds (default: 5.0)
    pub build_cap_seconds: f32,
    /// Minimum build duration before a drop can fire (default: 0.5)
    pub min_build_seconds: f32,
    /// Fraction of the peak tracker that arms the drop (default: 0.85)
    pub drop_ratio: f32,
    /// Per-tick multiplicative decay of the peak tracker (default: 0.9)
    pub peak_decay: f32,
    /// Seconds the drop phase persists (default: 0.5)
    pub drop_hold_seconds: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            window_seconds: 2.5,
            short_window: 0.6,
            long_window: 1.8,
            build_gap: 0.05,
            build_ratio: 1.2,
            build_cap_seconds: 5.0,
            min_build_seconds: 0.5,
            drop_ratio: 0.85,
            peak_decay: 0.9,
            drop_hold_seconds: 0.5,
        }
    }
}

impl TransitionConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.short_window <= 0.0 || self.long_window <= self.short_window {
            return Err(AnalysisError::InvalidConfig(
                "Transition windows must satisfy 0 < short < long".to_string(),
            ));
        }
        if self.window_seconds < self.long_window {
            return Err(AnalysisError::InvalidConfig(
                "Transition history must cover the long window".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.peak_decay) {
            return Err(AnalysisError::InvalidConfig(format!(
                "Peak decay must be in [0, 1), got {}",
                self.peak_decay
            )));
        }
        if self.drop_hold_seconds <= 0.0 || self.build_cap_seconds <= 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "Transition durations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Streaming build/drop detector
#[derive(Debug, Clone)]
pub struct TransitionDetector {
    cfg: TransitionConfig,
    history: VecDeque<(f32, f32)>,
    state: TransitionState,
    build_start: f32,
    drop_start: f32,
    peak_energy: f32,
    drop_fired: bool,
}

impl TransitionDetector {
    /// Create a detector with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` for inconsistent windows
    pub fn new(cfg: TransitionConfig) -> Result<Self, AnalysisError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            history: VecDeque::new(),
            state: TransitionState::default(),
            build_start: 0.0,
            drop_start: 0.0,
            peak_energy: 0.0,
            drop_fired: false,
        })
    }

    /// Run one tick with the current whole-spectrum mean energy
    ///
    /// Returns the updated state; `drop_fired()` reports whether this
    /// tick produced the single drop pulse.
    pub fn process(&mut self, energy: f32, now: f32) -> TransitionState {
        self.drop_fired = false;
        if !energy.is_finite() {
            log::warn!("Non-finite energy, skipping transition tick");
            return self.state;
        }

        self.history.push_back((now, energy));
        while let Some(&(t, _)) = self.history.front() {
            if now - t > self.cfg.window_seconds {
                self.history.pop_front();
            } else {
                break;
            }
        }

        // Peak tracker forgets stale peaks but never dips below current
        self.peak_energy = (self.peak_energy * self.cfg.peak_decay).max(energy);

        let short_avg = self.windowed_average(now, self.cfg.short_window);
        let long_avg = self.windowed_average(now, self.cfg.long_window);
        let gap = short_avg - long_avg;

        match self.state.phase {
            TransitionPhase::Steady => {
                if gap > self.cfg.build_gap && energy > self.cfg.build_ratio * long_avg {
                    self.build_start = now;
                    self.state = TransitionState {
                        phase: TransitionPhase::Building,
                        intensity: 0.0,
                    };
                    log::debug!("Build-up started at {:.3}s (gap {:.3})", now, gap);
                }
            }
            TransitionPhase::Building => {
                let build_duration = now - self.build_start;
                if gap < 0.0 {
                    // Energy fell away without a drop: the build fizzled
                    self.state = TransitionState::default();
                    log::debug!("Build-up fizzled at {:.3}s", now);
                } else if build_duration >= self.cfg.min_build_seconds
                    && energy > self.cfg.drop_ratio * self.peak_energy
                    && gap <= self.cfg.build_gap
                {
                    // Climb stalled near the tracked peak: the drop hits
                    self.drop_start = now;
                    self.drop_fired = true;
                    self.state = TransitionState {
                        phase: TransitionPhase::Dropping,
                        intensity: 1.0,
                    };
                    log::debug!("Drop at {:.3}s after {:.2}s build", now, build_duration);
                } else {
                    let duration_scale =
                        build_duration.min(self.cfg.build_cap_seconds) / self.cfg.build_cap_seconds;
                    let slope_scale = (gap / self.cfg.build_gap).min(2.0);
                    self.state = TransitionState {
                        phase: TransitionPhase::Building,
                        intensity: (duration_scale * slope_scale).clamp(0.0, 1.0),
                    };
                }
            }
            TransitionPhase::Dropping => {
                let elapsed = now - self.drop_start;
                if elapsed >= self.cfg.drop_hold_seconds {
                    self.state = TransitionState::default();
                } else {
                    self.state = TransitionState {
                        phase: TransitionPhase::Dropping,
                        intensity: (1.0 - elapsed / self.cfg.drop_hold_seconds).clamp(0.0, 1.0),
                    };
                }
            }
        }

        self.state
    }

    /// Current transition classification
    pub fn state(&self) -> TransitionState {
        self.state
    }

    /// Whether the most recent tick fired the drop pulse
    pub fn drop_fired(&self) -> bool {
        self.drop_fired
    }

    /// Discard all state for a new playback session
    pub fn reset(&mut self) {
        self.history.clear();
        self.state = TransitionState::default();
        self.build_start = 0.0;
        self.drop_start = 0.0;
        self.peak_energy = 0.0;
        self.drop_fired = false;
    }

    /// Average of history entries no older than `window` seconds
    fn windowed_average(&self, now: f32, window: f32) -> f32 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for &(t, v) in self.history.iter().rev() {
            if now - t > window {
                break;
            }
            sum += v;
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: f32 = 0.03;

    #[test]
    fn test_ramp_triggers_building_with_rising_intensity() {
        let mut det = TransitionDetector::new(TransitionConfig::default()).unwrap();
        let mut now = 0.0;

        // Settle the long window at a low level first
        for _ in 0..80 {
            det.process(0.1, now);
            now += TICK;
        }
        assert_eq!(det.state().phase, TransitionPhase::Steady);

        // Monotonic ramp over ~2.4s
        let mut building_seen = false;
        let mut first_intensity = 0.0;
        let mut last_intensity = 0.0;
        for i in 0..80 {
            let energy = 0.1 + 0.01 * i as f32;
            let state = det.process(energy, now);
            if state.phase == TransitionPhase::Building {
                if !building_seen {
                    first_intensity = state.intensity;
                    building_seen = true;
                }
                last_intensity = state.intensity;
            }
            now += TICK;
        }

        assert!(building_seen, "a sustained ramp should enter Building");
        assert!(
            last_intensity >= first_intensity,
            "build intensity should rise with duration: {} -> {}",
            first_intensity,
            last_intensity
        );
    }

    #[test]
    fn test_plateau_after_ramp_fires_single_drop() {
        let mut det = TransitionDetector::new(TransitionConfig::default()).unwrap();
        let mut now = 0.0;

        for _ in 0..80 {
            det.process(0.1, now);
            now += TICK;
        }
        for i in 0..80 {
            det.process(0.1 + 0.01 * i as f32, now);
            now += TICK;
        }
        assert_eq!(det.state().phase, TransitionPhase::Building);

        // Plateau near the tracked peak
        let mut drops = 0;
        let mut saw_dropping = false;
        for _ in 0..80 {
            let state = det.process(0.9, now);
            if det.drop_fired() {
                drops += 1;
            }
            if state.phase == TransitionPhase::Dropping {
                saw_dropping = true;
            }
            now += TICK;
        }

        assert_eq!(drops, 1, "the plateau must fire exactly one drop");
        assert!(saw_dropping);
        // After the hold the detector has reverted to Steady
        assert_eq!(det.state().phase, TransitionPhase::Steady);
    }

    #[test]
    fn test_drop_intensity_decays_over_hold() {
        let mut det = TransitionDetector::new(TransitionConfig::default()).unwrap();
        let mut now = 0.0;

        for _ in 0..80 {
            det.process(0.1, now);
            now += TICK;
        }
        for i in 0..80 {
            det.process(0.1 + 0.01 * i as f32, now);
            now += TICK;
        }

        // Walk into the drop, then sample the decaying intensity
        let mut intensities = Vec::new();
        for _ in 0..70 {
            let state = det.process(0.9, now);
            if state.phase == TransitionPhase::Dropping {
                intensities.push(state.intensity);
            }
            now += TICK;
        }

        assert!(intensities.len() >= 2, "drop phase should persist several ticks");
        for pair in intensities.windows(2) {
            assert!(
                pair[1] <= pair[0] + 1e-6,
                "drop intensity must decay linearly: {:?}",
                pair
            );
        }
    }

    #[test]
    fn test_fizzled_build_reverts_to_steady() {
        let mut det = TransitionDetector::new(TransitionConfig::default()).unwrap();
        let mut now = 0.0;

        for _ in 0..80 {
            det.process(0.1, now);
            now += TICK;
        }
        for i in 0..30 {
            det.process(0.1 + 0.015 * i as f32, now);
            now += TICK;
        }
        assert_eq!(det.state().phase, TransitionPhase::Building);

        // Energy collapses instead of dropping
        let mut fired = false;
        for _ in 0..80 {
            det.process(0.05, now);
            fired |= det.drop_fired();
            now += TICK;
        }
        assert!(!fired, "a fizzled build must not fire a drop");
        assert_eq!(det.state().phase, TransitionPhase::Steady);
    }

    #[test]
    fn test_steady_input_stays_steady() {
        let mut det = TransitionDetector::new(TransitionConfig::default()).unwrap();
        let mut now = 0.0;
        for _ in 0..300 {
            let state = det.process(0.5, now);
            assert_eq!(state.phase, TransitionPhase::Steady);
            assert_eq!(state.intensity, 0.0);
            now += TICK;
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(TransitionConfig::default().validate().is_ok());

        let bad = TransitionConfig {
            short_window: 2.0,
            ..TransitionConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = TransitionConfig {
            peak_decay: 1.0,
            ..TransitionConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
