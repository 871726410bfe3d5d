//! Streaming spectrum analyzer
//!
//! The analyzer owns the whole per-tick pipeline and runs it in a fixed
//! stage order on every frame:
//!
//! 1. Aggregate raw FFT bins into normalized, smoothed band energies
//! 2. Percussive onset detection on the fresh normalized/previous pair
//! 3. Vocal presence classification
//! 4. Bassline groove tracking
//! 5. Build/drop transition tracking
//!
//! Each stage reads state the earlier stages wrote this tick, so the
//! ordering is part of the contract. A detector error is logged and
//! treated as "no detection this tick"; it never aborts the frame.

use std::collections::VecDeque;

use crate::analysis::events::BeatEvent;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::features::groove::{GrooveDetector, GrooveState};
use crate::features::percussive::{BeatChannel, ChannelDetector};
use crate::features::transition::{TransitionDetector, TransitionPhase, TransitionState};
use crate::features::vocal::VocalDetector;
use crate::spectrum::aggregator::BandAggregator;
use crate::spectrum::bands::{BandLabel, BandMap};
use crate::spectrum::SpectrumFrame;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-6;

/// Single-pass streaming analyzer over live FFT magnitude frames
///
/// Feed frames with [`push_frame`](Self::push_frame), then drain discrete
/// detections with [`poll_events`](Self::poll_events) and read continuous
/// state through the getters. The analyzer keeps no lookahead: every
/// output is derived from the current frame and bounded history.
pub struct SpectrumAnalyzer {
    cfg: AnalyzerConfig,
    bands: BandMap,
    aggregator: BandAggregator,
    percussive: Vec<ChannelDetector>,
    vocal: VocalDetector,
    groove: GrooveDetector,
    transition: TransitionDetector,
    beat_times: VecDeque<f32>,
    events: Vec<BeatEvent>,
    last_time: f32,
}

impl SpectrumAnalyzer {
    /// Create an analyzer with default configuration at the given sample rate
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate
    pub fn new(sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::with_config(sample_rate, AnalyzerConfig::default())
    }

    /// Create an analyzer with explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidConfig` for invalid parameters and
    /// `AnalysisError::InvalidInput` for a zero sample rate
    pub fn with_config(sample_rate: u32, cfg: AnalyzerConfig) -> Result<Self, AnalysisError> {
        cfg.validate()?;

        let bands = BandMap::new(sample_rate, cfg.band_count)?;
        let aggregator = BandAggregator::new(
            cfg.band_count,
            cfg.smoothing_factor,
            cfg.normalization_gain,
            cfg.max_energy_alpha,
            cfg.max_energy_history,
        )?;

        let percussive = [
            BeatChannel::Kick,
            BeatChannel::Snare,
            BeatChannel::HiHat,
            BeatChannel::Clap,
        ]
        .into_iter()
        .map(|channel| {
            ChannelDetector::new(
                channel,
                cfg.percussive.cooldown(channel),
                cfg.energy_floor,
                cfg.flux_window,
                cfg.min_flux_samples,
            )
        })
        .collect();

        let vocal = VocalDetector::new(cfg.vocal.clone())?;
        let groove = GrooveDetector::new(cfg.groove.clone())?;
        let transition = TransitionDetector::new(cfg.transition.clone())?;

        Ok(Self {
            cfg,
            bands,
            aggregator,
            percussive,
            vocal,
            groove,
            transition,
            beat_times: VecDeque::new(),
            events: Vec::new(),
            last_time: f32::NEG_INFINITY,
        })
    }

    /// Ingest one spectrum frame and run the full detection pipeline
    ///
    /// An empty frame, a non-monotonic timestamp, or a non-finite frame
    /// is a skipped tick: all detector state is retained and no events
    /// are produced.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for structurally invalid
    /// frames (bin count disagreeing with `fft_size / 2`, zero sample
    /// rate, non-finite timestamp).
    pub fn push_frame(&mut self, frame: SpectrumFrame<'_>) -> Result<(), AnalysisError> {
        frame.validate()?;

        if frame.now_seconds < self.last_time {
            log::warn!(
                "Timestamp moved backwards ({:.3}s -> {:.3}s), skipping tick",
                self.last_time,
                frame.now_seconds
            );
            return Ok(());
        }

        // Sample-rate changes mid-stream rebuild the band map in place
        if self
            .bands
            .needs_rebuild(frame.sample_rate, self.cfg.band_count)
        {
            log::debug!("Rebuilding band map for sample rate {}", frame.sample_rate);
            self.bands = BandMap::new(frame.sample_rate, self.cfg.band_count)?;
        }

        if !self.aggregator.ingest(frame.bins) {
            return Ok(());
        }
        self.last_time = frame.now_seconds;
        let now = frame.now_seconds;

        self.run_percussive(now);
        self.run_vocal(now);
        self.run_groove(now);
        self.run_transition(now);

        Ok(())
    }

    fn run_percussive(&mut self, now: f32) {
        let curr = self.aggregator.normalized();
        let prev = self.aggregator.prev_normalized();
        for det in &mut self.percussive {
            match det.process(&self.bands, curr, prev, now) {
                Ok(Some(onset)) => {
                    let intensity = onset.intensity;
                    let event = match onset.channel {
                        BeatChannel::Kick => BeatEvent::Kick { intensity },
                        BeatChannel::Snare => BeatEvent::Snare { intensity },
                        BeatChannel::HiHat => BeatEvent::HiHat { intensity },
                        BeatChannel::Clap => BeatEvent::Clap { intensity },
                    };
                    self.events.push(event);
                    // Every fired channel lands in the shared beat history
                    if self.beat_times.len() == self.cfg.beat_history {
                        self.beat_times.pop_front();
                    }
                    self.beat_times.push_back(now);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("{} detector error: {}", det.channel().as_str(), e);
                }
            }
        }
    }

    fn run_vocal(&mut self, now: f32) {
        let result = self.vocal.process(
            &self.bands,
            self.aggregator.normalized(),
            self.aggregator.prev_normalized(),
            now,
        );
        match result {
            Ok(output) => {
                if output.onset {
                    self.events.push(BeatEvent::Vocal {
                        intensity: self.vocal.onset_intensity(),
                    });
                }
            }
            Err(e) => log::warn!("Vocal detector error: {}", e),
        }
    }

    fn run_groove(&mut self, now: f32) {
        let bass = self
            .bands
            .mean(self.aggregator.normalized(), BandLabel::Bass);
        let before = self.groove.state();
        let after = self.groove.process(bass, now);
        let pattern_changed = after.active && before.pattern != after.pattern;
        if pattern_changed {
            if let Some(pattern) = after.pattern {
                self.events.push(BeatEvent::Groove {
                    intensity: after.confidence,
                    pattern,
                });
            }
        }
    }

    fn run_transition(&mut self, now: f32) {
        let before = self.transition.state().phase;
        let after = self.transition.process(self.aggregator.mean_energy(), now);
        if after.phase != before {
            match after.phase {
                TransitionPhase::Building => {
                    self.events.push(BeatEvent::Transition {
                        intensity: after.intensity,
                        phase: TransitionPhase::Building,
                    });
                }
                TransitionPhase::Dropping => {
                    self.events.push(BeatEvent::Transition {
                        intensity: 1.0,
                        phase: TransitionPhase::Dropping,
                    });
                }
                TransitionPhase::Steady => {}
            }
        }
    }

    /// Drain all events produced since the last call
    pub fn poll_events(&mut self) -> Vec<BeatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Mean smoothed energy of one labelled band, in [0, 1]
    pub fn band_energy(&self, label: BandLabel) -> f32 {
        self.bands.mean(self.aggregator.smoothed(), label)
    }

    /// Whole-spectrum mean smoothed energy, in [0, 1]
    ///
    /// Suitable for driving a master brightness or amplitude parameter.
    pub fn visual_intensity(&self) -> f32 {
        self.aggregator.mean_smoothed()
    }

    /// Smoothed vocal presence in [0, 1]
    pub fn vocal_presence(&self) -> f32 {
        self.vocal.presence()
    }

    /// Current groove classification
    pub fn groove_state(&self) -> GrooveState {
        self.groove.state()
    }

    /// Current build/drop classification
    pub fn transition_state(&self) -> TransitionState {
        self.transition.state()
    }

    /// Tempo estimate from the shared beat history, in BPM
    ///
    /// Every fired percussive channel contributes its timestamp, so a
    /// snare- or hat-driven pattern still yields an estimate. Returns
    /// `None` until at least two onsets have been observed; the estimate
    /// is the reciprocal of the mean inter-onset interval, so an
    /// occasional missed beat widens the estimate rather than breaking it.
    pub fn estimated_bpm(&self) -> Option<f32> {
        if self.beat_times.len() < 2 {
            return None;
        }
        let first = self.beat_times.front()?;
        let last = self.beat_times.back()?;
        let span = last - first;
        if span < EPSILON {
            return None;
        }
        let mean_interval = span / (self.beat_times.len() - 1) as f32;
        Some(60.0 / mean_interval)
    }

    /// Configuration the analyzer was built with
    pub fn config(&self) -> &AnalyzerConfig {
        &self.cfg
    }

    /// Discard all state for a new playback session
    ///
    /// The configuration and band map survive; every history, detector
    /// state machine, and pending event is cleared.
    pub fn reset(&mut self) {
        self.aggregator.reset();
        for det in &mut self.percussive {
            det.reset();
        }
        self.vocal.reset();
        self.groove.reset();
        self.transition.reset();
        self.beat_times.clear();
        self.events.clear();
        self.last_time = f32::NEG_INFINITY;
    }
}
